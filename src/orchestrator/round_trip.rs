//! The review round-trip: render and push a document, later pull the
//! human's annotated copy back and summarise it.

use super::report::{
    RecordOutcome, Retrieval, RetrievalReport, RetrievedReview, Submission, render_summary,
};
use crate::errors::{RenderError, ReviewError};
use crate::ledger::{Ledger, ReviewRecord};
use crate::locator::{ArtifactLocator, Resolution};
use crate::render::{PandocRenderer, Renderer};
use crate::review_config::ReviewConfig;
use crate::transport::{AdbTransport, Transport, remote_join};
use crate::ui::ReviewUI;
use chrono::Local;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SUBMIT_STEPS: usize = 3;

/// Timestamp embedded in artifact names. Fixed width so names sort chronologically.
const NAME_STAMP: &str = "%Y%m%d_%H%M%S";

pub struct ReviewOrchestrator {
    ledger: Ledger,
    transport: Arc<dyn Transport>,
    renderer: Arc<dyn Renderer>,
    locator: ArtifactLocator,
    staging_dir: String,
    ui: Option<Arc<ReviewUI>>,
}

impl ReviewOrchestrator {
    pub fn new(
        ledger: Ledger,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn Renderer>,
        staging_dir: impl Into<String>,
        export_dir: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            transport,
            renderer,
            locator: ArtifactLocator::new(export_dir),
            staging_dir: staging_dir.into(),
            ui: None,
        }
    }

    /// Orchestrator wired to adb, pandoc and the project's ledger file.
    pub fn from_config(config: &ReviewConfig) -> Self {
        let device = &config.toml.device;
        let render = &config.toml.render;
        let transport = AdbTransport::new(
            config.adb_cmd(),
            config.serial(),
            device.viewer_component.clone(),
        );
        let renderer = PandocRenderer::new(
            config.pandoc_cmd(),
            render.pdf_engine.clone(),
            render.page_size.clone(),
        );
        Self::new(
            Ledger::open(config.state_file()),
            Arc::new(transport),
            Arc::new(renderer),
            config.staging_dir(),
            config.export_dir(),
        )
    }

    /// Report progress through `ui` as well as tracing.
    pub fn with_ui(mut self, ui: Arc<ReviewUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Pending reviews, ordered by local key.
    pub fn list_pending(&self) -> BTreeMap<String, ReviewRecord> {
        self.ledger.list_pending()
    }

    /// Render `document`, upload it to the staging directory, record it as
    /// pending and open it on the device.
    ///
    /// The ledger is only written after a successful upload. A viewer that
    /// fails to open is reported as a warning.
    pub async fn submit_for_review(&self, document: &str) -> Result<Submission, ReviewError> {
        let source = Path::new(document);
        if !source.is_file() {
            return Err(RenderError::SourceMissing(source.to_path_buf()).into());
        }
        let stem = file_stem(source).ok_or_else(|| ReviewError::InvalidPath(document.into()))?;

        let artifact_name = format!("{}_{}.pdf", stem, Local::now().format(NAME_STAMP));
        let local_artifact = source.with_file_name(&artifact_name);
        let remote_path = remote_join(&self.staging_dir, &artifact_name);

        self.step(1, "Converting Markdown to PDF...");
        self.renderer.render(source, &local_artifact).await?;
        self.detail(&format!("Rendered {}", local_artifact.display()));

        self.step(2, "Uploading to device...");
        self.transport.upload(&local_artifact, &remote_path).await?;
        self.detail(&format!("Uploaded to {}", remote_path));

        let original = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        self.ledger.record_submission(document, &remote_path, original)?;

        self.step(3, "Opening on device...");
        let mut warnings = Vec::new();
        if let Err(e) = self.transport.open_in_viewer(&remote_path).await {
            debug!(path = %remote_path, error = %e, "Viewer did not open");
            warnings.push(format!("Could not open viewer: {}", e));
        }

        info!(key = document, remote = %remote_path, "Submitted for review");
        Ok(Submission {
            local_key: document.to_string(),
            local_artifact,
            remote_path,
            warnings,
        })
    }

    /// Pull back every pending review whose key contains `pattern` (all when
    /// `None` or empty).
    ///
    /// Records are processed one at a time in key order; a failure is recorded
    /// against its own record and the rest carry on.
    pub async fn retrieve_reviews(&self, pattern: Option<&str>) -> Retrieval {
        let pattern = pattern.filter(|p| !p.is_empty());
        let targets: Vec<(String, ReviewRecord)> = self
            .ledger
            .list_pending()
            .into_iter()
            .filter(|(key, _)| pattern.is_none_or(|p| key.contains(p)))
            .collect();

        if targets.is_empty() {
            let message = match pattern {
                Some(p) => format!("No pending review matching '{}'", p),
                None => "No pending reviews found.".to_string(),
            };
            return Retrieval::NothingToDo { message };
        }

        let total = targets.len();
        let mut report = RetrievalReport::default();
        for (index, (key, record)) in targets.into_iter().enumerate() {
            self.step_of(index + 1, total, &format!("Retrieving {}...", key));
            let outcome = self.retrieve_one(key, &record).await;
            match &outcome.result {
                Ok(review) => self.success(&format!(
                    "{} -> {}",
                    outcome.local_key,
                    review.pulled_path.display()
                )),
                Err(e) => {
                    debug!(key = %outcome.local_key, error = %e, "Retrieval failed");
                    self.fail(&format!("{}: {}", outcome.local_key, e));
                }
            }
            report.outcomes.push(outcome);
        }
        Retrieval::Processed(report)
    }

    async fn retrieve_one(&self, key: String, record: &ReviewRecord) -> RecordOutcome {
        let resolution = self
            .locator
            .locate(&key, record, self.transport.as_ref())
            .await;
        for warning in &resolution.warnings {
            self.warn(warning);
        }
        let warnings = resolution.warnings.clone();
        let result = self.complete(&key, record, resolution).await;
        RecordOutcome {
            local_key: key,
            warnings,
            result,
        }
    }

    async fn complete(
        &self,
        key: &str,
        record: &ReviewRecord,
        resolution: Resolution,
    ) -> Result<RetrievedReview, ReviewError> {
        let original = &record.original_local_path;
        let stem = file_stem(original).ok_or_else(|| ReviewError::InvalidPath(key.into()))?;
        let document_name = original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());
        let dir = original.parent().unwrap_or_else(|| Path::new("."));

        let now = Local::now();
        let pulled_path = unique_path(
            dir,
            &format!("{}-reviewed-{}", stem, now.format(NAME_STAMP)),
            "pdf",
        );
        self.detail(&format!("Pulling {} ({})", resolution.remote_path, resolution.kind));
        self.transport
            .download(&resolution.remote_path, &pulled_path)
            .await?;

        let pulled_name = pulled_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary = render_summary(&document_name, now, &pulled_name, resolution.kind);
        let summary_path = dir.join(format!("{}-review.md", stem));
        std::fs::write(&summary_path, &summary).map_err(|source| ReviewError::WriteFailed {
            path: summary_path.clone(),
            source,
        })?;

        self.ledger.mark_completed(key)?;
        Ok(RetrievedReview {
            resolution,
            pulled_path,
            summary_path,
            summary,
        })
    }

    fn step(&self, index: usize, msg: &str) {
        self.step_of(index, SUBMIT_STEPS, msg);
    }

    fn step_of(&self, index: usize, total: usize, msg: &str) {
        if let Some(ui) = &self.ui {
            ui.start_step(index, total, msg);
        }
    }

    fn detail(&self, msg: &str) {
        if let Some(ui) = &self.ui {
            ui.log_step(msg);
        }
    }

    fn success(&self, msg: &str) {
        if let Some(ui) = &self.ui {
            ui.success(msg);
        }
    }

    fn warn(&self, msg: &str) {
        if let Some(ui) = &self.ui {
            ui.warn(msg);
        }
    }

    fn fail(&self, msg: &str) {
        if let Some(ui) = &self.ui {
            ui.fail(msg);
        }
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// `<dir>/<base>.<ext>`, or the first free `<dir>/<base>-N.<ext>`.
pub fn unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{}.{}", base, ext));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{}-{}.{}", base, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
