//! Model Context Protocol server.
//!
//! Exposes the review round-trip to AI assistants as three tools over a
//! JSON-RPC 2.0 stdio transport.

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use tools::{ToolHandler, ToolReply};
