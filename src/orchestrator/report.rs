//! Results of submit and retrieve operations, and the review summary format.

use crate::errors::ReviewError;
use crate::ledger::ReviewRecord;
use crate::locator::{MatchKind, Resolution};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STATUS_ANNOTATED: &str = "Review completed on device. See annotated PDF for details.";
const STATUS_ORIGINAL: &str =
    "No exported annotations were found on device; the original upload was retrieved.";

/// A document handed to the device.
#[derive(Debug, Clone)]
pub struct Submission {
    pub local_key: String,
    /// Rendered artifact next to the source document
    pub local_artifact: PathBuf,
    pub remote_path: String,
    /// Non-fatal problems, e.g. the viewer failed to open
    pub warnings: Vec<String>,
}

impl Submission {
    pub fn render(&self) -> String {
        let mut out = format!(
            "Sent {} for review.\n  -> PDF: {}\n  -> Remote: {}",
            self.local_key,
            self.local_artifact.display(),
            self.remote_path
        );
        for warning in &self.warnings {
            out.push_str(&format!("\n[WARN] {}", warning));
        }
        out
    }
}

/// A review pulled back from the device.
#[derive(Debug, Clone)]
pub struct RetrievedReview {
    pub resolution: Resolution,
    pub pulled_path: PathBuf,
    pub summary_path: PathBuf,
    pub summary: String,
}

/// Outcome for one targeted ledger record.
#[derive(Debug)]
pub struct RecordOutcome {
    pub local_key: String,
    pub warnings: Vec<String>,
    pub result: Result<RetrievedReview, ReviewError>,
}

impl RecordOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-record results of one retrieval, in processing order.
#[derive(Debug, Default)]
pub struct RetrievalReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl RetrievalReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &RetrievedReview)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.local_key.as_str(), r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ReviewError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.local_key.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.success_count() == 0
    }

    /// One-line tally.
    pub fn tally(&self) -> String {
        format!(
            "Retrieved {} review(s), {} failed.",
            self.success_count(),
            self.failure_count()
        )
    }

    /// Warnings and failures as `[WARN]` / `[FAILED]` lines.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for outcome in &self.outcomes {
            for warning in &outcome.warnings {
                lines.push(format!("[WARN] {}: {}", outcome.local_key, warning));
            }
            if let Err(e) = &outcome.result {
                lines.push(format!("[FAILED] {}: {}", outcome.local_key, e));
            }
        }
        lines
    }

    /// Full text for agent consumption: every summary, then diagnostics, then the tally.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (_, review) in self.succeeded() {
            out.push_str(&review.summary);
            out.push('\n');
        }
        for line in self.diagnostics() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&self.tally());
        out
    }
}

/// Result of `retrieve_reviews`.
#[derive(Debug)]
pub enum Retrieval {
    /// Nothing was targeted; not an error.
    NothingToDo { message: String },
    Processed(RetrievalReport),
}

impl Retrieval {
    pub fn render(&self) -> String {
        match self {
            Retrieval::NothingToDo { message } => message.clone(),
            Retrieval::Processed(report) => report.render(),
        }
    }
}

/// `Pending Reviews:` followed by one line per record, or a fixed message.
pub fn render_pending(pending: &BTreeMap<String, ReviewRecord>) -> String {
    if pending.is_empty() {
        return "No pending reviews.".to_string();
    }
    let mut out = String::from("Pending Reviews:");
    for (key, record) in pending {
        let name = Path::new(key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.clone());
        out.push_str(&format!(
            "\n- {} (Out since: {})",
            name,
            record
                .submitted_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

/// Markdown summary written next to the document and returned to callers.
pub fn render_summary(
    document_name: &str,
    completed_at: DateTime<Local>,
    pulled_name: &str,
    kind: MatchKind,
) -> String {
    let status = match kind {
        MatchKind::Exact | MatchKind::Fuzzy => STATUS_ANNOTATED,
        MatchKind::Fallback => STATUS_ORIGINAL,
    };
    format!(
        "# Review: {document_name}\n\n\
         **Date:** {date}\n\
         **Annotated PDF:** [{pulled_name}]({pulled_name})\n\n\
         ## Status\n\
         {status}\n",
        date = completed_at.format("%Y-%m-%d %H:%M"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use chrono::TimeZone;

    fn retrieved(summary: &str) -> RetrievedReview {
        RetrievedReview {
            resolution: Resolution {
                remote_path: "/storage/emulated/0/EXPORT/a_1.pdf".to_string(),
                kind: MatchKind::Exact,
                warnings: Vec::new(),
            },
            pulled_path: PathBuf::from("/w/a-reviewed-1.pdf"),
            summary_path: PathBuf::from("/w/a-review.md"),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_render_summary_layout() {
        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 5, 0).unwrap();
        let summary = render_summary(
            "notes.md",
            at,
            "notes-reviewed-20261016_090500.pdf",
            MatchKind::Exact,
        );
        assert_eq!(
            summary,
            "# Review: notes.md\n\n\
             **Date:** 2026-10-16 09:05\n\
             **Annotated PDF:** [notes-reviewed-20261016_090500.pdf](notes-reviewed-20261016_090500.pdf)\n\n\
             ## Status\n\
             Review completed on device. See annotated PDF for details.\n"
        );
    }

    #[test]
    fn test_render_summary_flags_fallback() {
        let at = Local.with_ymd_and_hms(2026, 10, 16, 9, 5, 0).unwrap();
        let summary = render_summary("notes.md", at, "n.pdf", MatchKind::Fallback);
        assert!(summary.contains("original upload was retrieved"));
        assert!(!summary.contains("See annotated PDF"));
    }

    #[test]
    fn test_report_keeps_success_and_failure_apart() {
        let report = RetrievalReport {
            outcomes: vec![
                RecordOutcome {
                    local_key: "a.md".to_string(),
                    warnings: vec!["Found alternative".to_string()],
                    result: Ok(retrieved("# Review: a.md\n")),
                },
                RecordOutcome {
                    local_key: "b.md".to_string(),
                    warnings: Vec::new(),
                    result: Err(TransportError::RemoteMissing("/x/b_1.pdf".into()).into()),
                },
            ],
        };

        assert_eq!(report.success_count(), 1);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.all_failed());

        let text = report.render();
        assert!(text.contains("# Review: a.md"));
        assert!(text.contains("[WARN] a.md: Found alternative"));
        assert!(text.contains("[FAILED] b.md: Remote path does not exist: /x/b_1.pdf"));
        assert!(text.ends_with("Retrieved 1 review(s), 1 failed."));
    }

    #[test]
    fn test_render_pending_lists_file_names() {
        let mut pending = BTreeMap::new();
        pending.insert(
            "docs/notes.md".to_string(),
            ReviewRecord::pending("/remote/notes_1.pdf", PathBuf::from("/w/docs/notes.md")),
        );
        let text = render_pending(&pending);
        assert!(text.starts_with("Pending Reviews:\n- notes.md (Out since: "));
        assert_eq!(render_pending(&BTreeMap::new()), "No pending reviews.");
    }

    #[test]
    fn test_empty_report_is_not_all_failed() {
        assert!(!RetrievalReport::default().all_failed());
    }
}
