//! The review operations exposed as MCP tools.
//!
//! Domain failures are returned as text with `is_error` set so the calling
//! model sees them; only malformed calls become protocol errors.

use crate::guide::{LIST_REVIEWS, REQUEST_REVIEW, RETRIEVE_REVIEW, tool_definitions};
use crate::orchestrator::{Retrieval, ReviewOrchestrator, render_pending};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Tool schema as listed by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolReply {
    pub text: String,
    pub is_error: bool,
}

impl ToolReply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// A call that could not be dispatched.
#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RequestReviewParams {
    file_path: String,
}

#[derive(Deserialize, Default)]
struct RetrieveReviewParams {
    #[serde(default)]
    file_pattern: Option<String>,
}

pub struct ToolHandler {
    orchestrator: Arc<ReviewOrchestrator>,
}

impl ToolHandler {
    pub fn new(orchestrator: Arc<ReviewOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        tool_definitions()
            .into_iter()
            .map(|tool| Tool {
                name: tool.name.to_string(),
                description: tool.description.to_string(),
                input_schema: tool.parameters,
            })
            .collect()
    }

    pub async fn execute(
        &self,
        tool_name: &str,
        params: Value,
    ) -> Result<ToolReply, ToolCallError> {
        debug!(tool = tool_name, "Executing tool");

        match tool_name {
            REQUEST_REVIEW => {
                let params: RequestReviewParams = parse_params(tool_name, params)?;
                Ok(self.request_review(&params.file_path).await)
            }
            RETRIEVE_REVIEW => {
                let params: RetrieveReviewParams = if params.is_null() {
                    RetrieveReviewParams::default()
                } else {
                    parse_params(tool_name, params)?
                };
                Ok(self.retrieve_review(params.file_pattern.as_deref()).await)
            }
            LIST_REVIEWS => Ok(ToolReply::ok(render_pending(
                &self.orchestrator.list_pending(),
            ))),
            _ => {
                warn!(tool = tool_name, "Unknown tool");
                Err(ToolCallError::UnknownTool(tool_name.to_string()))
            }
        }
    }

    async fn request_review(&self, file_path: &str) -> ToolReply {
        match self.orchestrator.submit_for_review(file_path).await {
            Ok(submission) => ToolReply::ok(submission.render()),
            Err(e) => ToolReply::error(format!("Error sending review: {}", e)),
        }
    }

    async fn retrieve_review(&self, pattern: Option<&str>) -> ToolReply {
        let retrieval = self.orchestrator.retrieve_reviews(pattern).await;
        let text = retrieval.render();
        match retrieval {
            Retrieval::Processed(report) if report.all_failed() => ToolReply::error(text),
            _ => ToolReply::ok(text),
        }
    }
}

fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, ToolCallError> {
    serde_json::from_value(params).map_err(|source| ToolCallError::InvalidArguments {
        tool: tool.to_string(),
        source,
    })
}
