use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use pie_config::Ranking;
use pie_domain::{CodePattern, order, pattern::normalize_tag, text};

/// Fuzzy multi-criteria query. Only `framework` is a hard filter; everything else is scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
	pub framework: Option<String>,
	pub category: Option<String>,
	#[serde(default)]
	pub tags: BTreeSet<String>,
	pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPattern {
	pub score: f32,
	pub pattern: CodePattern,
}

/// Per-pattern signals, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Signals {
	category: f32,
	tags: f32,
	text: f32,
	relevance: f32,
	usage: f32,
}
impl Signals {
	fn weighted(self, ranking: &Ranking) -> f32 {
		let total = ranking.category_weight
			+ ranking.tag_weight
			+ ranking.text_weight
			+ ranking.relevance_weight
			+ ranking.usage_weight;

		if total <= 0.0 {
			return 0.0;
		}

		let sum = ranking.category_weight * self.category
			+ ranking.tag_weight * self.tags
			+ ranking.text_weight * self.text
			+ ranking.relevance_weight * self.relevance
			+ ranking.usage_weight * self.usage;

		sum / total
	}
}

struct PreparedQuery<'a> {
	framework: Option<&'a str>,
	category: Option<&'a str>,
	tags: BTreeSet<String>,
	keywords: Vec<String>,
}
impl<'a> PreparedQuery<'a> {
	fn new(query: &'a SearchQuery, max_terms: usize) -> Self {
		let non_blank = |value: &'a Option<String>| {
			value.as_deref().map(str::trim).filter(|value| !value.is_empty())
		};

		Self {
			framework: non_blank(&query.framework),
			category: non_blank(&query.category),
			tags: query
				.tags
				.iter()
				.map(|tag| normalize_tag(tag))
				.filter(|tag| !tag.is_empty())
				.collect(),
			keywords: query
				.text
				.as_deref()
				.map(|raw| text::tokenize_terms(raw, max_terms))
				.unwrap_or_default(),
		}
	}

	fn signals(&self, pattern: &CodePattern, max_usage: u64) -> Signals {
		let category = match self.category {
			Some(category) if category != pattern.category => 0.0,
			_ => 1.0,
		};
		let tags = if self.tags.is_empty() {
			1.0
		} else {
			let shared = self.tags.iter().filter(|tag| pattern.has_tag(tag)).count();

			shared as f32 / self.tags.len() as f32
		};
		let text = if self.keywords.is_empty() {
			1.0
		} else {
			let title = pattern.title.to_lowercase();
			let description = pattern.description.to_lowercase();
			let found = self
				.keywords
				.iter()
				.filter(|keyword| {
					title.contains(keyword.as_str()) || description.contains(keyword.as_str())
				})
				.count();

			found as f32 / self.keywords.len() as f32
		};
		let usage =
			if max_usage == 0 { 0.0 } else { pattern.usage_count as f32 / max_usage as f32 };

		Signals {
			category,
			tags,
			text,
			relevance: pattern.relevance_score.clamp(0.0, 1.0),
			usage,
		}
	}
}

/// Scores and orders `patterns` against `query`.
///
/// Patterns from another framework are dropped before scoring. The result is a total order:
/// score, then relevance, then usage (all descending), then id ascending, so the input order
/// never matters.
pub fn rank(
	patterns: Vec<CodePattern>,
	query: &SearchQuery,
	ranking: &Ranking,
) -> Vec<ScoredPattern> {
	let prepared = PreparedQuery::new(query, ranking.max_query_terms);
	let candidates: Vec<CodePattern> = patterns
		.into_iter()
		.filter(|pattern| prepared.framework.is_none_or(|framework| pattern.framework == framework))
		.collect();
	let max_usage = candidates.iter().map(|pattern| pattern.usage_count).max().unwrap_or(0);
	let mut scored: Vec<ScoredPattern> = candidates
		.into_iter()
		.map(|pattern| {
			let score = prepared.signals(&pattern, max_usage).weighted(ranking);

			ScoredPattern { score, pattern }
		})
		.collect();

	scored.sort_by(|a, b| {
		order::cmp_f32_desc(a.score, b.score).then_with(|| order::cmp_catalog(&a.pattern, &b.pattern))
	});

	scored
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;

	fn pattern(
		id: &str,
		framework: &str,
		category: &str,
		tags: &[&str],
		relevance: f32,
	) -> CodePattern {
		let now = OffsetDateTime::UNIX_EPOCH;

		CodePattern {
			id: id.to_string(),
			category: category.to_string(),
			framework: framework.to_string(),
			version: "1.0".to_string(),
			title: format!("{category} with {}", tags.join(" ")),
			description: format!("How to approach {category} in {framework}."),
			code: "fn main() {}".to_string(),
			tags: tags.iter().map(|tag| tag.to_string()).collect(),
			usage_count: 0,
			relevance_score: relevance,
			created_at: now,
			updated_at: now,
		}
	}

	fn ids(scored: &[ScoredPattern]) -> Vec<&str> {
		scored.iter().map(|item| item.pattern.id.as_str()).collect()
	}

	fn react_query(tags: &[&str]) -> SearchQuery {
		SearchQuery {
			framework: Some("react".to_string()),
			tags: tags.iter().map(|tag| tag.to_string()).collect(),
			..Default::default()
		}
	}

	#[test]
	fn tag_overlap_outranks_relevance_gap() {
		let patterns = vec![
			pattern("p2", "react", "performance", &["memo"], 0.8),
			pattern("p1", "react", "state-management", &["hooks"], 0.9),
		];
		let scored = rank(patterns, &react_query(&["hooks"]), &Ranking::default());

		assert_eq!(ids(&scored), vec!["p1", "p2"]);
		assert!(scored[0].score > scored[1].score);
	}

	#[test]
	fn framework_is_a_hard_filter() {
		let patterns = vec![
			pattern("r1", "react", "hooks", &["hooks"], 0.1),
			pattern("v1", "vue", "hooks", &["hooks"], 1.0),
		];
		let scored = rank(patterns, &react_query(&["hooks"]), &Ranking::default());

		assert_eq!(ids(&scored), vec!["r1"]);
	}

	#[test]
	fn empty_query_orders_by_relevance() {
		let patterns = vec![
			pattern("a", "react", "hooks", &["x"], 0.2),
			pattern("b", "vue", "routing", &["y"], 0.7),
			pattern("c", "svelte", "stores", &["z"], 0.5),
		];
		let scored = rank(patterns, &SearchQuery::default(), &Ranking::default());

		assert_eq!(ids(&scored), vec!["b", "c", "a"]);
	}

	#[test]
	fn text_terms_match_title_or_description() {
		let patterns = vec![
			pattern("a", "react", "forms", &["input"], 0.5),
			pattern("b", "react", "routing", &["router"], 0.5),
		];
		let query = SearchQuery { text: Some("Routing, in REACT".to_string()), ..Default::default() };
		let scored = rank(patterns, &query, &Ranking::default());

		assert_eq!(ids(&scored), vec!["b", "a"]);
	}

	#[test]
	fn ordering_ignores_input_order() {
		let mut patterns = vec![
			pattern("d", "react", "hooks", &["hooks"], 0.5),
			pattern("a", "react", "hooks", &["hooks"], 0.5),
			pattern("c", "react", "hooks", &["memo"], 0.5),
			pattern("b", "react", "perf", &["hooks"], 0.5),
		];
		let query = react_query(&["hooks"]);
		let forward = rank(patterns.clone(), &query, &Ranking::default());

		patterns.reverse();

		let backward = rank(patterns, &query, &Ranking::default());

		assert_eq!(forward, backward);
		assert_eq!(ids(&forward), vec!["a", "b", "d", "c"]);
	}

	#[test]
	fn raising_relevance_or_usage_never_lowers_score() {
		let base = vec![
			pattern("a", "react", "hooks", &["hooks"], 0.4),
			pattern("b", "react", "hooks", &["memo"], 0.6),
		];
		let query = react_query(&["hooks"]);
		let before = rank(base.clone(), &query, &Ranking::default());
		let score_of = |scored: &[ScoredPattern], id: &str| {
			scored.iter().find(|item| item.pattern.id == id).map(|item| item.score).unwrap_or(-1.0)
		};
		let mut boosted = base.clone();

		boosted[0].relevance_score = 0.9;

		let after_relevance = rank(boosted.clone(), &query, &Ranking::default());

		boosted[0].usage_count = 10;

		let after_usage = rank(boosted, &query, &Ranking::default());

		assert!(score_of(&after_relevance, "a") > score_of(&before, "a"));
		assert!(score_of(&after_usage, "a") > score_of(&after_relevance, "a"));
		assert_eq!(after_usage[0].pattern.id, "a");
	}
}
