pub mod errors;
pub mod guide;
pub mod ledger;
pub mod locator;
pub mod mcp;
pub mod orchestrator;
pub mod render;
pub mod review_config;
pub mod transport;
pub mod ui;
