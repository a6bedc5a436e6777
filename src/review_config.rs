//! Unified configuration for manta-review.
//!
//! Settings are read from `.manta/manta.toml` in the project directory and layered:
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [device]
//! serial = "192.168.1.20:5555"
//! adb_cmd = "adb"
//! staging_dir = "/storage/emulated/0/Document/PDFs/ForReview"
//! export_dir = "/storage/emulated/0/EXPORT"
//! viewer_component = "com.supernote.document/.MainActivity"
//!
//! [render]
//! pandoc_cmd = "pandoc"
//! pdf_engine = "weasyprint"
//! page_size = "A5"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project working directory.
pub const MANTA_DIR: &str = ".manta";

/// Ledger document inside [`MANTA_DIR`].
pub const STATE_FILE: &str = "state.json";

/// Configuration file inside [`MANTA_DIR`].
pub const CONFIG_FILE: &str = "manta.toml";

pub const ENV_ADB_CMD: &str = "MANTA_ADB_CMD";
pub const ENV_DEVICE_SERIAL: &str = "MANTA_DEVICE_SERIAL";
pub const ENV_PANDOC_CMD: &str = "MANTA_PANDOC_CMD";

/// Device bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Pin a specific adb serial instead of auto-selecting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// adb executable
    #[serde(default = "default_adb_cmd")]
    pub adb_cmd: String,
    /// Remote directory uploads are pushed to
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    /// Remote directory the device's export function writes to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    /// Activity used to open uploads in the native viewer
    #[serde(default = "default_viewer_component")]
    pub viewer_component: String,
}

fn default_adb_cmd() -> String {
    "adb".to_string()
}

fn default_staging_dir() -> String {
    "/storage/emulated/0/Document/PDFs/ForReview".to_string()
}

fn default_export_dir() -> String {
    "/storage/emulated/0/EXPORT".to_string()
}

fn default_viewer_component() -> String {
    "com.supernote.document/.MainActivity".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_cmd: default_adb_cmd(),
            staging_dir: default_staging_dir(),
            export_dir: default_export_dir(),
            viewer_component: default_viewer_component(),
        }
    }
}

/// Markdown rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// pandoc executable
    #[serde(default = "default_pandoc_cmd")]
    pub pandoc_cmd: String,
    /// HTML-to-PDF engine handed to pandoc
    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,
    /// CSS page size, e.g. "A5"
    #[serde(default = "default_page_size")]
    pub page_size: String,
}

fn default_pandoc_cmd() -> String {
    "pandoc".to_string()
}

fn default_pdf_engine() -> String {
    "weasyprint".to_string()
}

fn default_page_size() -> String {
    "A5".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pandoc_cmd: default_pandoc_cmd(),
            pdf_engine: default_pdf_engine(),
            page_size: default_page_size(),
        }
    }
}

/// The complete manta.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewToml {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

impl ReviewToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse manta.toml")
    }

    /// Load `manta.toml` from the given `.manta` directory, or defaults if absent.
    pub fn load_or_default(manta_dir: &Path) -> Result<Self> {
        let config_path = manta_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize manta.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (name, dir) in [
            ("staging_dir", &self.device.staging_dir),
            ("export_dir", &self.device.export_dir),
        ] {
            if !dir.starts_with('/') {
                warnings.push(format!(
                    "device.{} '{}' should be an absolute device path",
                    name, dir
                ));
            }
        }

        if trim_slash(&self.device.staging_dir) == trim_slash(&self.device.export_dir) {
            warnings.push(
                "device.staging_dir and device.export_dir are the same directory; \
                 exact matches will always find the un-annotated upload"
                    .to_string(),
            );
        }

        for (name, cmd) in [
            ("device.adb_cmd", &self.device.adb_cmd),
            ("device.viewer_component", &self.device.viewer_component),
            ("render.pandoc_cmd", &self.render.pandoc_cmd),
            ("render.pdf_engine", &self.render.pdf_engine),
        ] {
            if cmd.trim().is_empty() {
                warnings.push(format!("{} must not be empty", name));
            }
        }

        warnings
    }
}

fn trim_slash(dir: &str) -> &str {
    dir.trim_end_matches('/')
}

/// Pick the environment value over the file value, falling back to the default.
fn layered(env_value: Option<String>, file_value: &str) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| file_value.to_string())
}

/// Configuration combining manta.toml with environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Directory the ledger and config live under (defaults to the cwd)
    pub project_dir: PathBuf,
    /// Path to the `.manta` directory
    pub manta_dir: PathBuf,
    /// Parsed manta.toml
    pub toml: ReviewToml,
    /// CLI override: verbose output
    pub verbose: bool,
    /// CLI override: device serial
    pub cli_serial: Option<String>,
}

impl ReviewConfig {
    /// Create a config rooted at `project_dir`, loading manta.toml if present.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let manta_dir = project_dir.join(MANTA_DIR);
        let toml = ReviewToml::load_or_default(&manta_dir)?;

        Ok(Self {
            project_dir,
            manta_dir,
            toml,
            verbose: false,
            cli_serial: None,
        })
    }

    /// Create a config with CLI overrides applied.
    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        serial: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.cli_serial = serial;
        Ok(config)
    }

    /// adb executable (env → file → default).
    pub fn adb_cmd(&self) -> String {
        layered(std::env::var(ENV_ADB_CMD).ok(), &self.toml.device.adb_cmd)
    }

    /// pandoc executable (env → file → default).
    pub fn pandoc_cmd(&self) -> String {
        layered(std::env::var(ENV_PANDOC_CMD).ok(), &self.toml.render.pandoc_cmd)
    }

    /// Pinned device serial (CLI → env → file), `None` means auto-select.
    pub fn serial(&self) -> Option<String> {
        self.cli_serial
            .clone()
            .or_else(|| std::env::var(ENV_DEVICE_SERIAL).ok())
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.toml.device.serial.clone())
    }

    pub fn staging_dir(&self) -> &str {
        &self.toml.device.staging_dir
    }

    pub fn export_dir(&self) -> &str {
        &self.toml.device.export_dir
    }

    /// Path to the ledger document.
    pub fn state_file(&self) -> PathBuf {
        self.manta_dir.join(STATE_FILE)
    }

    /// Path to manta.toml.
    pub fn config_file(&self) -> PathBuf {
        self.manta_dir.join(CONFIG_FILE)
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
