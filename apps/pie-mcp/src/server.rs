use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use pie_service::{Error, PieService, Tool};

#[derive(Clone)]
struct PieMcp {
	service: Arc<PieService>,
	tool_router: ToolRouter<Self>,
}
impl PieMcp {
	fn new(service: Arc<PieService>) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}

	async fn invoke(&self, tool: Tool, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		into_call_result(self.service.dispatch(tool.name(), Value::Object(params)).await)
	}
}

#[rmcp::tool_router]
impl PieMcp {
	#[rmcp::tool(
		name = "get-patterns",
		description = "List patterns matching an exact framework and/or category, most relevant first.",
		input_schema = get_patterns_schema()
	)]
	async fn get_patterns(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::GetPatterns, params).await
	}

	#[rmcp::tool(
		name = "search-patterns",
		description = "Rank patterns by category, tag overlap, free text, relevance and usage.",
		input_schema = search_patterns_schema()
	)]
	async fn search_patterns(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::SearchPatterns, params).await
	}

	#[rmcp::tool(
		name = "get-pattern",
		description = "Fetch one pattern by id and count it as used.",
		input_schema = get_pattern_schema()
	)]
	async fn get_pattern(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::GetPattern, params).await
	}

	#[rmcp::tool(
		name = "train-pattern",
		description = "Add a new code pattern to the catalog.",
		input_schema = train_pattern_schema()
	)]
	async fn train_pattern(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::TrainPattern, params).await
	}

	#[rmcp::tool(
		name = "get-statistics",
		description = "Count patterns, frameworks and categories in the catalog.",
		input_schema = empty_schema()
	)]
	async fn get_statistics(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::GetStatistics, params).await
	}

	#[rmcp::tool(
		name = "set-endless-mode",
		description = "Toggle compact responses that archive full results behind an observation id.",
		input_schema = set_endless_mode_schema()
	)]
	async fn set_endless_mode(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::SetEndlessMode, params).await
	}

	#[rmcp::tool(
		name = "get-observation",
		description = "Fetch a full result archived while endless mode was on.",
		input_schema = get_observation_schema()
	)]
	async fn get_observation(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		self.invoke(Tool::GetObservation, params).await
	}
}

#[rmcp::tool_handler]
impl ServerHandler for PieMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Pattern intelligence for coding agents: look up, search and train reusable code patterns. Enable endless mode to receive compact summaries with an obs_id for the full result."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_mcp(bind_addr: &str, service: Arc<PieService>) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let mcp_service = StreamableHttpService::new(
		move || Ok(PieMcp::new(service.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new().fallback_service(mcp_service);
	let listener = TcpListener::bind(bind_addr).await?;

	tracing::info!(%bind_addr, "MCP server listening.");

	axum::serve(listener, router).await?;

	Ok(())
}

fn into_call_result(result: pie_service::Result<Value>) -> Result<CallToolResult, ErrorData> {
	match result {
		Ok(value) => Ok(CallToolResult::structured(value)),
		Err(err @ (Error::InvalidArguments { .. } | Error::UnknownTool { .. })) =>
			Err(ErrorData::invalid_params(err.to_string(), None)),
		Err(err) => {
			tracing::debug!(error_code = err.code(), error = %err, "Tool call failed.");

			Ok(CallToolResult::structured_error(json!({
				"error_code": err.code(),
				"message": err.to_string(),
			})))
		},
	}
}

fn empty_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {}
	}))
}

fn get_patterns_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"framework": { "type": ["string", "null"] },
			"category": { "type": ["string", "null"] },
			"limit": { "type": ["integer", "null"], "minimum": 1 }
		}
	}))
}

fn search_patterns_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"framework": { "type": ["string", "null"] },
			"category": { "type": ["string", "null"] },
			"tags": { "type": "array", "items": { "type": "string" } },
			"query": { "type": ["string", "null"] },
			"limit": { "type": ["integer", "null"], "minimum": 1 }
		}
	}))
}

fn get_pattern_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["id"],
		"properties": {
			"id": { "type": "string" }
		}
	}))
}

fn train_pattern_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["framework", "category", "title", "description", "code", "tags"],
		"properties": {
			"id": { "type": ["string", "null"] },
			"framework": { "type": "string" },
			"category": { "type": "string" },
			"version": { "type": ["string", "null"] },
			"title": { "type": "string" },
			"description": { "type": "string", "minLength": 20 },
			"code": { "type": "string", "minLength": 10 },
			"tags": { "type": "array", "minItems": 1, "items": { "type": "string" } },
			"relevance_score": { "type": ["number", "null"], "minimum": 0, "maximum": 1 }
		}
	}))
}

fn set_endless_mode_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["enabled"],
		"properties": {
			"enabled": { "type": "boolean" }
		}
	}))
}

fn get_observation_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["obs_id"],
		"properties": {
			"obs_id": { "type": "string" }
		}
	}))
}

#[cfg(test)]
mod tests {
	use rmcp::model::ErrorCode;
	use serde_json::json;

	use pie_service::{Error, Tool};

	use super::into_call_result;

	#[test]
	fn argument_errors_become_invalid_params() {
		let err = into_call_result(Err(Error::InvalidArguments { reason: "bad".to_string() }))
			.expect_err("Expected a protocol error.");

		assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

		let err = into_call_result(Err(Error::UnknownTool { name: "nope".to_string() }))
			.expect_err("Expected a protocol error.");

		assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
	}

	#[test]
	fn domain_errors_become_structured_tool_errors() {
		let result = into_call_result(Err(Error::NotFound {
			kind: "observation",
			id: "nonexistent".to_string(),
		}))
		.expect("Expected a tool result.");

		assert_eq!(result.is_error, Some(true));
		assert_eq!(
			result.structured_content.as_ref().and_then(|value| value.get("error_code")),
			Some(&json!("NOT_FOUND"))
		);
	}

	#[test]
	fn success_is_structured() {
		let result = into_call_result(Ok(json!({ "endless_mode": true }))).expect("tool result");

		assert_ne!(result.is_error, Some(true));
		assert_eq!(result.structured_content, Some(json!({ "endless_mode": true })));
	}

	#[test]
	fn routes_every_served_tool() {
		let routed = super::PieMcp::tool_router().list_all();

		for tool in Tool::ALL.into_iter().filter(|tool| *tool != Tool::AnalyzeProject) {
			let served = routed
				.iter()
				.find(|served| served.name == tool.name())
				.unwrap_or_else(|| panic!("Missing tool: {}.", tool.name()));

			assert_eq!(served.description.as_deref(), Some(tool.description()));
		}

		assert_eq!(routed.len(), Tool::ALL.len() - 1);
	}
}
