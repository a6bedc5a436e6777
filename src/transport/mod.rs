//! Device transport capability.
//!
//! The orchestrator and locator only see the [`Transport`] trait; the real
//! implementation is [`AdbTransport`], tests supply their own doubles.

pub mod adb;

pub use adb::AdbTransport;

use crate::errors::TransportError;
use async_trait::async_trait;
use std::path::Path;

/// Abstraction over the remote device filesystem and shell.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push a local file, creating remote parent directories as needed.
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), TransportError>;

    /// Pull a remote file to a local path.
    async fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), TransportError>;

    async fn exists(&self, remote_path: &str) -> Result<bool, TransportError>;

    /// File names in a remote directory; empty when the directory does not exist.
    async fn list_directory(&self, remote_dir: &str) -> Result<Vec<String>, TransportError>;

    /// Open a remote file in the device's viewer. Best effort.
    async fn open_in_viewer(&self, remote_path: &str) -> Result<(), TransportError>;
}

/// Join a remote directory and a file name with exactly one separator.
pub fn remote_join(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Parent directory of a remote path.
pub fn remote_parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}
