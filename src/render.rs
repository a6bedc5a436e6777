//! Markdown to paginated PDF rendering.
//!
//! [`PandocRenderer`] drives `pandoc` with an HTML-based PDF engine and a
//! stylesheet tuned for e-ink: high contrast, serif body text, small pages.

use crate::errors::RenderError;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Converts a source document into a paginated artifact.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, source: &Path, destination: &Path) -> Result<(), RenderError>;
}

const EINK_CSS: &str = r#"
@page {
    size: {page_size};
    margin: 15mm;
}
body {
    font-family: "Georgia", serif;
    font-size: 11pt;
    line-height: 1.5;
    color: black;
    background-color: white;
}
h1, h2, h3, h4 {
    font-family: "Georgia", serif;
    font-weight: bold;
    margin-top: 1.2em;
}
h1 { font-size: 18pt; }
h2 { font-size: 15pt; }
h3 { font-size: 13pt; }

code, pre {
    font-family: "Courier New", monospace;
    font-size: 9pt;
    background-color: #f0f0f0;
}
blockquote {
    border-left: 2px solid black;
    padding-left: 1em;
    margin-left: 0;
    font-style: italic;
    font-size: 10pt;
}
img {
    max-width: 100%;
    height: auto;
}
"#;

/// The e-ink stylesheet for a given CSS page size.
pub fn eink_stylesheet(page_size: &str) -> String {
    EINK_CSS.replace("{page_size}", page_size)
}

pub struct PandocRenderer {
    pandoc_cmd: String,
    pdf_engine: String,
    page_size: String,
}

impl PandocRenderer {
    pub fn new(
        pandoc_cmd: impl Into<String>,
        pdf_engine: impl Into<String>,
        page_size: impl Into<String>,
    ) -> Self {
        Self {
            pandoc_cmd: pandoc_cmd.into(),
            pdf_engine: pdf_engine.into(),
            page_size: page_size.into(),
        }
    }

    fn write_stylesheet(&self) -> Result<tempfile::NamedTempFile, RenderError> {
        let mut css = tempfile::Builder::new()
            .prefix("manta-eink-")
            .suffix(".css")
            .tempfile()
            .map_err(RenderError::Stylesheet)?;
        css.write_all(eink_stylesheet(&self.page_size).as_bytes())
            .map_err(RenderError::Stylesheet)?;
        css.flush().map_err(RenderError::Stylesheet)?;
        Ok(css)
    }
}

#[async_trait]
impl Renderer for PandocRenderer {
    async fn render(&self, source: &Path, destination: &Path) -> Result<(), RenderError> {
        if !source.is_file() {
            return Err(RenderError::SourceMissing(source.to_path_buf()));
        }

        // Dropping the handle deletes the file, so it must outlive the pandoc call.
        let css = self.write_stylesheet()?;

        debug!(
            source = %source.display(),
            destination = %destination.display(),
            engine = %self.pdf_engine,
            "Rendering document"
        );

        let output = Command::new(&self.pandoc_cmd)
            .arg(source)
            .arg("--from")
            .arg("markdown")
            .arg("-o")
            .arg(destination)
            .arg(format!("--pdf-engine={}", self.pdf_engine))
            .arg("--css")
            .arg(css.path())
            .output()
            .await
            .map_err(|source| RenderError::ToolMissing {
                command: self.pandoc_cmd.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !destination.exists() {
            return Err(RenderError::NoOutput(destination.to_path_buf()));
        }

        Ok(())
    }
}
