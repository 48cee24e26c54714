use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
	Error, PieService, Result,
	search::{self, ScoredPattern, SearchQuery},
};
use pie_domain::CodePattern;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetPatternsRequest {
	pub framework: Option<String>,
	pub category: Option<String>,
	pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPatternsResponse {
	pub total: usize,
	pub patterns: Vec<CodePattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPatternsRequest {
	pub framework: Option<String>,
	pub category: Option<String>,
	#[serde(default)]
	pub tags: BTreeSet<String>,
	pub query: Option<String>,
	pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPatternsResponse {
	pub total: usize,
	pub results: Vec<ScoredPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPatternRequest {
	pub id: String,
}

impl PieService {
	/// Exact-match listing. Reading through this path never counts as usage.
	pub fn get_patterns(&self, req: GetPatternsRequest) -> Result<GetPatternsResponse> {
		let limit = self.resolve_limit(req.limit)?;
		let framework = non_blank(req.framework.as_deref());
		let category = non_blank(req.category.as_deref());
		let mut patterns = self.store.list_by(framework, category);
		let total = patterns.len();

		patterns.truncate(limit);

		Ok(GetPatternsResponse { total, patterns })
	}

	pub fn search_patterns(&self, req: SearchPatternsRequest) -> Result<SearchPatternsResponse> {
		let limit = self.resolve_limit(req.limit)?;
		let query = SearchQuery {
			framework: non_blank(req.framework.as_deref()).map(str::to_string),
			category: non_blank(req.category.as_deref()).map(str::to_string),
			tags: req.tags,
			text: non_blank(req.query.as_deref()).map(str::to_string),
		};
		let snapshot = self.store.snapshot(query.framework.as_deref());
		let mut results = search::rank(snapshot, &query, &self.cfg.ranking);
		let total = results.len();

		results.truncate(limit);

		tracing::debug!(
			framework = ?query.framework,
			tags = query.tags.len(),
			total,
			"Pattern search ranked."
		);

		Ok(SearchPatternsResponse { total, results })
	}

	/// Returns one pattern and records the retrieval.
	pub fn get_pattern(&self, req: GetPatternRequest) -> Result<CodePattern> {
		let id = req.id.trim();

		if id.is_empty() {
			return Err(Error::invalid_arguments("id must be non-empty."));
		}

		Ok(self.store.touch_usage(id)?)
	}

	fn resolve_limit(&self, requested: Option<usize>) -> Result<usize> {
		let limits = &self.cfg.limits;

		match requested {
			None => Ok(limits.default_limit.min(limits.max_limit)),
			Some(0) => Err(Error::invalid_arguments("limit must be greater than zero.")),
			Some(limit) => Ok(limit.min(limits.max_limit)),
		}
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|value| !value.is_empty())
}
