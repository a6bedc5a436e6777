//! Artifact resolution for completed reviews.
//!
//! The device's export function copies an annotated document into a fixed
//! export directory, but the file name it picks is not guaranteed to match the
//! upload. Resolution is a fixed priority chain:
//!
//! 1. **Exact**: the upload's file name exists in the export directory.
//! 2. **Fuzzy**: export entries sharing the document stem and extension; the
//!    lexicographically greatest wins.
//! 3. **Fallback**: the original, un-annotated upload.
//!
//! Fuzzy selection is a best-effort heuristic over a rename the device
//! controls. Lexicographic order equals chronological order only for
//! fixed-width, zero-padded suffixes such as the `_%Y%m%d_%H%M%S` stamps this
//! crate writes.

use crate::ledger::ReviewRecord;
use crate::transport::{Transport, remote_join};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// `<stem>_<YYYYMMDD>_<HHMMSS>` as produced by submission naming.
static SUBMISSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<stem>.+)_\d{8}_\d{6}$").expect("submission suffix pattern is valid")
});

/// How a remote artifact was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
    Fallback,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Fuzzy => write!(f, "fuzzy"),
            MatchKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Outcome of [`ArtifactLocator::locate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub remote_path: String,
    pub kind: MatchKind,
    /// Degraded-but-continuing conditions met along the way
    pub warnings: Vec<String>,
}

pub struct ArtifactLocator {
    export_dir: String,
}

impl ArtifactLocator {
    pub fn new(export_dir: impl Into<String>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &str {
        &self.export_dir
    }

    /// Resolve the remote artifact for `record`. Never fails: query errors
    /// become warnings and resolution continues down the chain.
    pub async fn locate(
        &self,
        local_key: &str,
        record: &ReviewRecord,
        transport: &dyn Transport,
    ) -> Resolution {
        let mut warnings = Vec::new();
        let file_name = record.device_file_name();
        let exact_path = remote_join(&self.export_dir, file_name);

        match transport.exists(&exact_path).await {
            Ok(true) => {
                debug!(path = %exact_path, "Exact export match");
                return Resolution {
                    remote_path: exact_path,
                    kind: MatchKind::Exact,
                    warnings,
                };
            }
            Ok(false) => {}
            Err(e) => {
                debug!(path = %exact_path, error = %e, "Exact export check failed");
                warnings.push(format!("Could not check {}: {}", exact_path, e));
            }
        }

        let stem = document_stem(file_name, local_key);
        let extension = extension_of(file_name);
        let listing = match transport.list_directory(&self.export_dir).await {
            Ok(names) => names,
            Err(e) => {
                debug!(dir = %self.export_dir, error = %e, "Listing exports failed");
                warnings.push(format!("Error listing exports: {}", e));
                Vec::new()
            }
        };

        let matches = candidates(&listing, &stem, extension);
        if let Some(best) = matches.iter().copied().max() {
            warnings.push(format!("Exact match not found. Found alternative: {}", best));
            if matches.len() > 1 {
                warnings.push(format!(
                    "{} exports share the name '{}'; chose the greatest: {}",
                    matches.len(),
                    stem,
                    best
                ));
            }
            return Resolution {
                remote_path: remote_join(&self.export_dir, best),
                kind: MatchKind::Fuzzy,
                warnings,
            };
        }

        warnings.push("No exported annotations found. Pulling original file.".to_string());
        Resolution {
            remote_path: record.device_path.clone(),
            kind: MatchKind::Fallback,
            warnings,
        }
    }
}

/// Stem shared by every export of a document.
///
/// Strips the extension and a trailing submission timestamp from the uploaded
/// file name. Names without a recognizable timestamp fall back to the stem of
/// the local document.
pub fn document_stem(device_file_name: &str, local_key: &str) -> String {
    let without_ext = device_file_name
        .rsplit_once('.')
        .map(|(base, _)| base)
        .unwrap_or(device_file_name);

    if let Some(caps) = SUBMISSION_SUFFIX.captures(without_ext) {
        return caps["stem"].to_string();
    }

    Path::new(local_key)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| without_ext.to_string())
}

/// Extension including the dot, or empty.
fn extension_of(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|idx| &file_name[idx..])
        .unwrap_or("")
}

/// Exports sharing `stem` and `extension`, in listing order.
fn candidates<'a>(names: &'a [String], stem: &str, extension: &str) -> Vec<&'a str> {
    let prefix = format!("{}_", stem);
    names
        .iter()
        .filter(|name| name.starts_with(&prefix) && name.ends_with(extension))
        .map(String::as_str)
        .collect()
}
