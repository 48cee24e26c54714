pub mod analyze;
pub mod mode;
pub mod observation;
pub mod patterns;
pub mod render;
pub mod search;
pub mod tools;
pub mod train;

mod error;

pub use analyze::{AnalyzeProjectRequest, ProjectAnalyzer};
pub use error::{Error, Result};
pub use mode::ModeController;
pub use observation::{
	GetObservationRequest, SetEndlessModeRequest, SetEndlessModeResponse, StatisticsResponse,
};
pub use patterns::{
	GetPatternRequest, GetPatternsRequest, GetPatternsResponse, SearchPatternsRequest,
	SearchPatternsResponse,
};
pub use render::{CompactResponse, Summarize};
pub use search::{ScoredPattern, SearchQuery};
pub use tools::{Tool, ToolCall, ToolRegistry};
pub use train::{TrainPatternRequest, TrainPatternResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use pie_config::Config;
use pie_storage::{ObservationArchive, PatternStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Answers tool invocations from the pattern catalog, rendering them in full or compact form.
pub struct PieService {
	pub cfg: Config,
	pub store: Arc<PatternStore>,
	pub archive: Arc<ObservationArchive>,
	pub mode: ModeController,
	analyzer: Option<Arc<dyn ProjectAnalyzer>>,
	registry: ToolRegistry,
	flush_lock: Mutex<()>,
}
impl PieService {
	pub fn new(
		cfg: Config,
		store: Arc<PatternStore>,
		archive: Arc<ObservationArchive>,
		mode: ModeController,
	) -> Self {
		Self {
			cfg,
			store,
			archive,
			mode,
			analyzer: None,
			registry: ToolRegistry::new(false),
			flush_lock: Mutex::new(()),
		}
	}

	/// Enables `analyze-project`.
	pub fn with_analyzer(mut self, analyzer: Arc<dyn ProjectAnalyzer>) -> Self {
		self.analyzer = Some(analyzer);
		self.registry = ToolRegistry::new(true);

		self
	}

	pub fn registry(&self) -> &ToolRegistry {
		&self.registry
	}

	/// Resolves `name`, parses `args` for it and runs it.
	pub async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
		let tool = self.registry.resolve(name)?;
		let call = ToolCall::parse(tool, args)?;

		self.call(call).await
	}

	pub async fn call(&self, call: ToolCall) -> Result<Value> {
		let tool = call.tool();

		if !self.registry.contains(tool) {
			return Err(Error::UnknownTool { name: tool.name().to_string() });
		}

		// Sampled once so a concurrent toggle cannot change this response halfway.
		let endless = self.mode.get();

		match call {
			ToolCall::GetPatterns(req) => {
				let result = self.get_patterns(req)?;

				self.respond(tool, &result, endless).await
			},
			ToolCall::SearchPatterns(req) => {
				let result = self.search_patterns(req)?;

				self.respond(tool, &result, endless).await
			},
			ToolCall::AnalyzeProject(req) => {
				let result = self.analyze_project(req).await?;

				self.respond(tool, &result, endless).await
			},
			ToolCall::GetPattern(req) => to_json(&self.get_pattern(req)?),
			ToolCall::TrainPattern(req) => to_json(&self.train_pattern(req).await?),
			ToolCall::GetStatistics => to_json(&self.get_statistics()),
			ToolCall::SetEndlessMode(req) => to_json(&self.set_endless_mode(req)),
			ToolCall::GetObservation(req) => self.get_observation(req).await,
		}
	}

	async fn respond<T>(&self, tool: Tool, result: &T, endless: bool) -> Result<Value>
	where
		T: Serialize + Summarize,
	{
		let full = to_json(result)?;

		if !endless || !tool.is_compactable() {
			return Ok(full);
		}

		let content = serde_json::to_string(&full).map_err(encode_error)?;

		if content.len() < self.cfg.endless.min_archive_bytes {
			return Ok(full);
		}

		let bytes = content.len();
		let summary = result.summarize(tool.name(), &self.cfg.endless);
		let obs_id = self.archive.put(tool.name(), content).await?;

		tracing::debug!(tool = tool.name(), %obs_id, bytes, "Result archived behind summary.");

		to_json(&CompactResponse { summary, obs_id })
	}
}

fn to_json<T>(value: &T) -> Result<Value>
where
	T: Serialize,
{
	serde_json::to_value(value).map_err(encode_error)
}

fn encode_error(err: serde_json::Error) -> Error {
	Error::EncodeFailed { message: err.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn encode_failures_are_not_archive_failures() {
		let err = serde_json::from_str::<Value>("{").expect_err("Expected a parse error.");

		assert_eq!(encode_error(err).code(), "ENCODE_FAILED");
	}
}
