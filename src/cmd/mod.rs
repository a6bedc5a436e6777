//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled           |
//! |----------|----------------------------|
//! | `review` | `Review`, `Done`, `List`   |
//! | `guide`  | `Usage`, `Tools`           |
//! | `config` | `Config`                   |
//! | `serve`  | `Serve`                    |
//!
//! Progress goes to stderr; summaries and listings go to stdout so they can be
//! piped to an agent.

pub mod config;
pub mod guide;
pub mod review;
pub mod serve;

pub use config::cmd_config;
pub use guide::{cmd_tools, cmd_usage};
pub use review::{cmd_done, cmd_list, cmd_review};
pub use serve::cmd_serve;
