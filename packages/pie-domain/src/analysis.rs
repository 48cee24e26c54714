use std::fmt;

use serde::{Deserialize, Serialize};

/// Output of the external project analyzer. Treated as an opaque, already built result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
	pub project_name: String,
	pub project_type: String,
	pub framework: Option<String>,
	pub dependencies: Vec<DependencySummary>,
	pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySummary {
	pub name: String,
	pub version: String,
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub dev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
	pub severity: SeverityLevel,
	pub category: String,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
	Info,
	Warning,
	Error,
}

impl fmt::Display for SeverityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}
