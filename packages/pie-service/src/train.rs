use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PieService, Result};
use pie_domain::{CodePattern, PatternRecord};
use pie_storage::loader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPatternRequest {
	pub id: Option<String>,
	pub framework: String,
	pub category: String,
	#[serde(default)]
	pub version: Option<String>,
	pub title: String,
	pub description: String,
	pub code: String,
	#[serde(default)]
	pub tags: Vec<String>,
	pub relevance_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPatternResponse {
	pub id: String,
	pub created: bool,
}

impl PieService {
	pub async fn train_pattern(&self, req: TrainPatternRequest) -> Result<TrainPatternResponse> {
		let id = match req.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
			Some(id) => id.to_string(),
			None => generate_id(&req.framework, &req.category),
		};
		let mut record = PatternRecord {
			id,
			category: req.category,
			framework: req.framework,
			version: req.version.unwrap_or_default(),
			title: req.title,
			description: req.description,
			code: req.code,
			tags: req.tags,
			usage_count: 0,
			relevance_score: 0.5,
			created_at: None,
			updated_at: None,
		};

		if let Some(relevance_score) = req.relevance_score {
			record.relevance_score = relevance_score;
		}

		let pattern = self.store.add(record)?;

		tracing::info!(
			pattern_id = %pattern.id,
			framework = %pattern.framework,
			category = %pattern.category,
			"Pattern trained."
		);

		if self.cfg.patterns.flush_on_train {
			self.flush_pattern(&pattern).await;
		}

		Ok(TrainPatternResponse { id: pattern.id, created: true })
	}

	/// Adds a trained pattern to its framework file. Failures are logged; the in-memory
	/// catalog stays authoritative.
	async fn flush_pattern(&self, pattern: &CodePattern) {
		let framework = pattern.framework.as_str();
		let Some(dir) = self.cfg.patterns.dir.as_deref() else {
			tracing::warn!(framework, "flush_on_train is set but patterns.dir is not configured.");

			return;
		};
		let _guard = self.flush_lock.lock().await;

		if let Err(err) = loader::append_pattern(dir, pattern.clone()).await {
			tracing::error!(
				error = %err,
				framework,
				pattern_id = %pattern.id,
				"Failed to flush pattern file."
			);
		}
	}
}

fn generate_id(framework: &str, category: &str) -> String {
	let suffix = Uuid::new_v4().simple().to_string();

	format!("{}-{}-{}", framework.trim(), category.trim(), &suffix[..8])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_ids_are_prefixed_and_distinct() {
		let first = generate_id("react", "hooks");
		let second = generate_id(" react ", "hooks");

		assert!(first.starts_with("react-hooks-"));
		assert_eq!(first.len(), "react-hooks-".len() + 8);
		assert!(second.starts_with("react-hooks-"));
		assert_ne!(first, second);
	}
}
