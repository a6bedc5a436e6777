//! Agent integration text: the protocol guide printed by `usage` and the tool
//! schemas shared by `tools` and the MCP server.

use serde::Serialize;
use serde_json::{Value, json};

pub const REQUEST_REVIEW: &str = "request_review";
pub const RETRIEVE_REVIEW: &str = "retrieve_review";
pub const LIST_REVIEWS: &str = "list_reviews";

pub const USAGE_GUIDE: &str = r#"
# E-Ink Review Integration Guide

manta-review gives an AI agent a human-in-the-loop review step on a
Supernote-class e-ink tablet connected over adb (USB or `adb connect <ip>`).

## Playbook for Agents
Add the following to your system prompt:

---
### Tablet Review Capabilities
You can hand documents to the user's e-ink tablet for handwritten review.
1. **request_review(file_path)**: renders a Markdown file to PDF, pushes it to the
   tablet and opens it. Tell the user it has been sent, then wait until they say
   they have exported it from the tablet.
2. **retrieve_review(file_pattern?)**: pulls the exported, annotated PDF back and
   returns a short Markdown summary for every matching pending review.
3. **list_reviews()**: shows which documents are still out for review.
---

## Command Line
    manta-review review docs/draft.md   # send
    manta-review list                   # what is outstanding
    manta-review done draft             # retrieve; summary on stdout
    manta-review serve                  # MCP server on stdio
    manta-review tools                  # tool schemas as JSON

## Multimodal Workflow
The summary returned by retrieve_review links the pulled PDF by file name; it sits
next to the source document. A multimodal model should open that PDF to read the
handwritten notes and drawings. A summary whose status says the original upload
was retrieved means no export was found and the PDF carries no annotations.
"#;

/// Name, description and JSON Schema parameters of one agent tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: REQUEST_REVIEW,
            description: "Push a markdown file to the e-ink tablet for human review. \
                Converts it to PDF, uploads it and opens it on the device. The user \
                reviews it and exports it when done.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to the markdown file to review"
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: RETRIEVE_REVIEW,
            description: "Pull annotated PDFs back from the tablet and return a review \
                summary for each. Use after the user has exported the document. \
                Without file_pattern every pending review is retrieved.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_pattern": {
                        "type": "string",
                        "description": "Only retrieve pending reviews whose path contains this text"
                    }
                }
            }),
        },
        ToolDefinition {
            name: LIST_REVIEWS,
            description: "List documents that were sent for review and not yet retrieved.",
            parameters: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// Tool schemas in OpenAI function-calling format.
pub fn openai_tool_schemas() -> Value {
    let functions: Vec<Value> = tool_definitions()
        .into_iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                }
            })
        })
        .collect();
    Value::Array(functions)
}
