//! Static agent integration output: `usage` and `tools`.

use anyhow::Result;
use manta_review::guide::{USAGE_GUIDE, openai_tool_schemas};

pub fn cmd_usage() {
    println!("{}", USAGE_GUIDE);
}

pub fn cmd_tools() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&openai_tool_schemas())?);
    Ok(())
}
