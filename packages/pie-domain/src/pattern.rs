use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const DEFAULT_RELEVANCE_SCORE: f32 = 0.5;

/// A stored, reusable code example.
///
/// `id` is unique across the whole catalog. After creation only `usage_count`,
/// `relevance_score` and `updated_at` change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePattern {
	pub id: String,
	pub category: String,
	pub framework: String,
	pub version: String,
	pub title: String,
	pub description: String,
	pub code: String,
	pub tags: BTreeSet<String>,
	pub usage_count: u64,
	pub relevance_score: f32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

/// A candidate pattern as handed over by a loader or a training call.
///
/// Nothing here is trusted; run it through [`crate::pattern_gate`] before
/// turning it into a [`CodePattern`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
	pub id: String,
	pub category: String,
	pub framework: String,
	#[serde(default)]
	pub version: String,
	pub title: String,
	pub description: String,
	pub code: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub usage_count: u64,
	#[serde(default = "default_relevance_score")]
	pub relevance_score: f32,
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub updated_at: Option<OffsetDateTime>,
}

impl CodePattern {
	pub fn has_tag(&self, tag: &str) -> bool {
		self.tags.contains(tag)
	}
}

impl PatternRecord {
	/// Builds the stored form. String fields are trimmed and tags are lowercased.
	pub fn into_pattern(self, now: OffsetDateTime) -> CodePattern {
		let created_at = self.created_at.unwrap_or(now);
		let updated_at = self.updated_at.unwrap_or(created_at).max(created_at);

		CodePattern {
			id: self.id.trim().to_string(),
			category: self.category.trim().to_string(),
			framework: self.framework.trim().to_string(),
			version: self.version.trim().to_string(),
			title: self.title.trim().to_string(),
			description: self.description.trim().to_string(),
			code: self.code,
			tags: normalize_tags(&self.tags),
			usage_count: self.usage_count,
			relevance_score: self.relevance_score,
			created_at,
			updated_at,
		}
	}
}

impl From<CodePattern> for PatternRecord {
	fn from(pattern: CodePattern) -> Self {
		Self {
			id: pattern.id,
			category: pattern.category,
			framework: pattern.framework,
			version: pattern.version,
			title: pattern.title,
			description: pattern.description,
			code: pattern.code,
			tags: pattern.tags.into_iter().collect(),
			usage_count: pattern.usage_count,
			relevance_score: pattern.relevance_score,
			created_at: Some(pattern.created_at),
			updated_at: Some(pattern.updated_at),
		}
	}
}

pub fn normalize_tag(tag: &str) -> String {
	tag.trim().to_lowercase()
}

pub fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
	tags.iter().map(|tag| normalize_tag(tag)).filter(|tag| !tag.is_empty()).collect()
}

fn default_relevance_score() -> f32 {
	DEFAULT_RELEVANCE_SCORE
}
