use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{BoxFuture, Error, PieService, Result};
use pie_domain::{AnalysisResult, safety};

/// Inspects a project tree and reports what it finds. Provided by the embedding application.
pub trait ProjectAnalyzer
where
	Self: Send + Sync,
{
	fn analyze<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, color_eyre::Result<AnalysisResult>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeProjectRequest {
	pub path: String,
}

impl PieService {
	pub async fn analyze_project(&self, req: AnalyzeProjectRequest) -> Result<AnalysisResult> {
		let Some(analyzer) = self.analyzer.as_ref() else {
			return Err(Error::UnknownTool { name: "analyze-project".to_string() });
		};
		let path = validate_project_path(&req.path)?;
		let result = analyzer
			.analyze(&path)
			.await
			.map_err(|err| Error::Analysis { message: format!("{err:#}") })?;

		tracing::info!(
			path = %path.display(),
			project_type = %result.project_type,
			suggestions = result.suggestions.len(),
			"Project analyzed."
		);

		Ok(result)
	}
}

fn validate_project_path(raw: &str) -> Result<PathBuf> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(Error::invalid_arguments("path must be non-empty."));
	}
	if trimmed.contains('\0') {
		return Err(Error::invalid_arguments("path must not contain NUL bytes."));
	}

	let path = PathBuf::from(trimmed);

	if safety::escapes_root(&path) {
		return Err(Error::PathTraversal { input: trimmed.to_string() });
	}

	Ok(path)
}
