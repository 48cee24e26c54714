use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub patterns: Patterns,
	pub archive: Archive,
	#[serde(default)]
	pub endless: Endless,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub mcp_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	#[serde(default = "default_true")]
	pub bind_localhost_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Patterns {
	/// Directory holding `*.json` pattern definition files.
	pub dir: Option<PathBuf>,
	/// Rewrite the trained pattern's framework file after every successful training call.
	#[serde(default)]
	pub flush_on_train: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Archive {
	pub dir: PathBuf,
	#[serde(default = "default_max_entries")]
	pub max_entries: usize,
	pub max_total_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endless {
	pub summary_top_n: usize,
	pub summary_max_chars: usize,
	/// Results smaller than this are returned in full even when endless mode is on.
	pub min_archive_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub category_weight: f32,
	pub tag_weight: f32,
	pub text_weight: f32,
	pub relevance_weight: f32,
	pub usage_weight: f32,
	pub max_query_terms: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
	pub default_limit: usize,
	pub max_limit: usize,
}

impl Default for Endless {
	fn default() -> Self {
		Self { summary_top_n: 5, summary_max_chars: 80, min_archive_bytes: 0 }
	}
}

impl Default for Ranking {
	fn default() -> Self {
		Self {
			category_weight: 0.20,
			tag_weight: 0.25,
			text_weight: 0.15,
			relevance_weight: 0.25,
			usage_weight: 0.15,
			max_query_terms: 16,
		}
	}
}

impl Default for Limits {
	fn default() -> Self {
		Self { default_limit: 10, max_limit: 100 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_true() -> bool {
	true
}

fn default_max_entries() -> usize {
	1_000_000
}
