use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
	AnalyzeProjectRequest, Error, GetObservationRequest, GetPatternRequest, GetPatternsRequest,
	Result, SearchPatternsRequest, SetEndlessModeRequest, TrainPatternRequest,
};

/// Every operation the service exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
	GetPatterns,
	SearchPatterns,
	GetPattern,
	TrainPattern,
	GetStatistics,
	SetEndlessMode,
	GetObservation,
	AnalyzeProject,
}
impl Tool {
	pub const ALL: [Self; 8] = [
		Self::GetPatterns,
		Self::SearchPatterns,
		Self::GetPattern,
		Self::TrainPattern,
		Self::GetStatistics,
		Self::SetEndlessMode,
		Self::GetObservation,
		Self::AnalyzeProject,
	];

	pub fn name(self) -> &'static str {
		match self {
			Self::GetPatterns => "get-patterns",
			Self::SearchPatterns => "search-patterns",
			Self::GetPattern => "get-pattern",
			Self::TrainPattern => "train-pattern",
			Self::GetStatistics => "get-statistics",
			Self::SetEndlessMode => "set-endless-mode",
			Self::GetObservation => "get-observation",
			Self::AnalyzeProject => "analyze-project",
		}
	}

	pub fn description(self) -> &'static str {
		match self {
			Self::GetPatterns =>
				"List patterns matching an exact framework and/or category, most relevant first.",
			Self::SearchPatterns =>
				"Rank patterns by category, tag overlap, free text, relevance and usage.",
			Self::GetPattern => "Fetch one pattern by id and count it as used.",
			Self::TrainPattern => "Add a new code pattern to the catalog.",
			Self::GetStatistics => "Count patterns, frameworks and categories in the catalog.",
			Self::SetEndlessMode =>
				"Toggle compact responses that archive full results behind an observation id.",
			Self::GetObservation => "Fetch a full result archived while endless mode was on.",
			Self::AnalyzeProject =>
				"Analyze a project directory and report its type, framework and suggestions.",
		}
	}

	/// Whether endless mode may replace this tool's result with a summary.
	pub fn is_compactable(self) -> bool {
		matches!(self, Self::GetPatterns | Self::SearchPatterns | Self::AnalyzeProject)
	}
}

/// A parsed invocation, one variant per tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
	GetPatterns(GetPatternsRequest),
	SearchPatterns(SearchPatternsRequest),
	GetPattern(GetPatternRequest),
	TrainPattern(TrainPatternRequest),
	GetStatistics,
	SetEndlessMode(SetEndlessModeRequest),
	GetObservation(GetObservationRequest),
	AnalyzeProject(AnalyzeProjectRequest),
}
impl ToolCall {
	pub fn parse(tool: Tool, args: Value) -> Result<Self> {
		let call = match tool {
			Tool::GetPatterns => Self::GetPatterns(parse_args(tool, args)?),
			Tool::SearchPatterns => Self::SearchPatterns(parse_args(tool, args)?),
			Tool::GetPattern => Self::GetPattern(parse_args(tool, args)?),
			Tool::TrainPattern => Self::TrainPattern(parse_args(tool, args)?),
			Tool::GetStatistics => Self::GetStatistics,
			Tool::SetEndlessMode => Self::SetEndlessMode(parse_args(tool, args)?),
			Tool::GetObservation => Self::GetObservation(parse_args(tool, args)?),
			Tool::AnalyzeProject => Self::AnalyzeProject(parse_args(tool, args)?),
		};

		Ok(call)
	}

	pub fn tool(&self) -> Tool {
		match self {
			Self::GetPatterns(_) => Tool::GetPatterns,
			Self::SearchPatterns(_) => Tool::SearchPatterns,
			Self::GetPattern(_) => Tool::GetPattern,
			Self::TrainPattern(_) => Tool::TrainPattern,
			Self::GetStatistics => Tool::GetStatistics,
			Self::SetEndlessMode(_) => Tool::SetEndlessMode,
			Self::GetObservation(_) => Tool::GetObservation,
			Self::AnalyzeProject(_) => Tool::AnalyzeProject,
		}
	}
}

/// Name to tool lookup for the tools this service instance can actually serve.
#[derive(Clone, Debug)]
pub struct ToolRegistry {
	by_name: BTreeMap<&'static str, Tool>,
}
impl ToolRegistry {
	pub fn new(with_analyzer: bool) -> Self {
		let by_name = Tool::ALL
			.into_iter()
			.filter(|tool| with_analyzer || *tool != Tool::AnalyzeProject)
			.map(|tool| (tool.name(), tool))
			.collect();

		Self { by_name }
	}

	pub fn resolve(&self, name: &str) -> Result<Tool> {
		self.by_name
			.get(name.trim())
			.copied()
			.ok_or_else(|| Error::UnknownTool { name: name.to_string() })
	}

	pub fn tools(&self) -> impl Iterator<Item = Tool> + '_ {
		self.by_name.values().copied()
	}

	pub fn contains(&self, tool: Tool) -> bool {
		self.by_name.contains_key(tool.name())
	}
}

fn parse_args<T>(tool: Tool, args: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	let args = match args {
		Value::Null => Value::Object(Default::default()),
		Value::Object(_) => args,
		_ => {
			return Err(Error::invalid_arguments(format!(
				"{} expects an object of named arguments.",
				tool.name()
			)));
		},
	};

	serde_json::from_value(args)
		.map_err(|err| Error::invalid_arguments(format!("{}: {err}.", tool.name())))
}
