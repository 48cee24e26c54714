//! Lossy projections of full tool results, returned instead of the result when endless mode is on.

use serde::Serialize;
use uuid::Uuid;

use crate::{GetPatternsResponse, SearchPatternsResponse, search::ScoredPattern};
use pie_config::Endless;
use pie_domain::{AnalysisResult, CodePattern, SeverityLevel, text};

/// Shape returned in place of a full result that was archived.
#[derive(Debug, Clone, Serialize)]
pub struct CompactResponse<S> {
	pub summary: S,
	pub obs_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternListSummary {
	pub tool: &'static str,
	/// Matches before the limit was applied.
	pub total: usize,
	/// Entries present in the archived result.
	pub shown: usize,
	pub top: Vec<PatternEntrySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternEntrySummary {
	pub id: String,
	pub framework: String,
	pub category: String,
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
	pub tool: &'static str,
	pub project_name: String,
	pub project_type: String,
	pub framework: Option<String>,
	pub dependencies: usize,
	pub suggestions: usize,
	pub top: Vec<SuggestionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionSummary {
	pub severity: SeverityLevel,
	pub category: String,
	pub message: String,
}

/// Results that can be replaced by a compact summary.
pub trait Summarize {
	type Summary: Serialize;

	fn summarize(&self, tool: &'static str, opts: &Endless) -> Self::Summary;
}

impl Summarize for GetPatternsResponse {
	type Summary = PatternListSummary;

	fn summarize(&self, tool: &'static str, opts: &Endless) -> Self::Summary {
		PatternListSummary {
			tool,
			total: self.total,
			shown: self.patterns.len(),
			top: self
				.patterns
				.iter()
				.take(opts.summary_top_n)
				.map(|pattern| entry(pattern, None, opts.summary_max_chars))
				.collect(),
		}
	}
}

impl Summarize for SearchPatternsResponse {
	type Summary = PatternListSummary;

	fn summarize(&self, tool: &'static str, opts: &Endless) -> Self::Summary {
		PatternListSummary {
			tool,
			total: self.total,
			shown: self.results.len(),
			top: self
				.results
				.iter()
				.take(opts.summary_top_n)
				.map(|ScoredPattern { score, pattern }| {
					entry(pattern, Some(*score), opts.summary_max_chars)
				})
				.collect(),
		}
	}
}

impl Summarize for AnalysisResult {
	type Summary = AnalysisSummary;

	fn summarize(&self, tool: &'static str, opts: &Endless) -> Self::Summary {
		let max_chars = opts.summary_max_chars;

		AnalysisSummary {
			tool,
			project_name: text::truncate_chars(&self.project_name, max_chars),
			project_type: self.project_type.clone(),
			framework: self.framework.clone(),
			dependencies: self.dependencies.len(),
			suggestions: self.suggestions.len(),
			top: self
				.suggestions
				.iter()
				.take(opts.summary_top_n)
				.map(|suggestion| SuggestionSummary {
					severity: suggestion.severity,
					category: suggestion.category.clone(),
					message: text::truncate_chars(&suggestion.message, max_chars),
				})
				.collect(),
		}
	}
}

fn entry(pattern: &CodePattern, score: Option<f32>, max_chars: usize) -> PatternEntrySummary {
	PatternEntrySummary {
		id: pattern.id.clone(),
		framework: pattern.framework.clone(),
		category: pattern.category.clone(),
		title: text::truncate_chars(&pattern.title, max_chars),
		score,
	}
}

#[cfg(test)]
mod tests {
	use pie_domain::{DependencySummary, Suggestion};

	use super::*;

	#[test]
	fn analysis_summary_counts_and_truncates() {
		let result = AnalysisResult {
			project_name: "demo".to_string(),
			project_type: "rust".to_string(),
			framework: Some("axum".to_string()),
			dependencies: vec![
				DependencySummary { name: "tokio".to_string(), version: "1".to_string(), dev: false },
				DependencySummary { name: "serde".to_string(), version: "1".to_string(), dev: false },
			],
			suggestions: vec![
				Suggestion {
					severity: SeverityLevel::Warning,
					category: "errors".to_string(),
					message: "Replace unwrap calls in request handlers with error propagation."
						.to_string(),
				},
				Suggestion {
					severity: SeverityLevel::Info,
					category: "style".to_string(),
					message: "Group imports.".to_string(),
				},
			],
		};
		let opts = Endless { summary_top_n: 1, summary_max_chars: 20, min_archive_bytes: 0 };
		let summary = result.summarize("analyze-project", &opts);

		assert_eq!(summary.dependencies, 2);
		assert_eq!(summary.suggestions, 2);
		assert_eq!(summary.top.len(), 1);
		assert_eq!(summary.top[0].message, "Replace unwrap ca...");
		assert_eq!(summary.top[0].severity, SeverityLevel::Warning);
	}
}
