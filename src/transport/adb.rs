//! Transport over the Android Debug Bridge.
//!
//! Every operation shells out to the `adb` executable, pinned to one device
//! serial chosen at connect time.

use super::{Transport, remote_parent};
use crate::errors::TransportError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

/// Marker adb's `ls` prints for absent paths.
const NO_SUCH_FILE: &str = "No such file";

/// Internal storage mount as seen by apps vs. the path intents expect.
const STORAGE_ROOT: &str = "/storage/emulated/0/";
const SDCARD_ROOT: &str = "/sdcard/";

/// Captured result of one adb invocation.
#[derive(Debug)]
struct AdbOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl AdbOutput {
    fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

pub struct AdbTransport {
    adb_cmd: String,
    pinned_serial: Option<String>,
    serial: OnceCell<String>,
    viewer_component: String,
}

impl AdbTransport {
    /// Build a transport. No adb call happens until the first operation.
    pub fn new(
        adb_cmd: impl Into<String>,
        pinned_serial: Option<String>,
        viewer_component: impl Into<String>,
    ) -> Self {
        Self {
            adb_cmd: adb_cmd.into(),
            pinned_serial,
            serial: OnceCell::new(),
            viewer_component: viewer_component.into(),
        }
    }

    /// Serial of the device in use, resolving it on first call.
    ///
    /// A pinned serial is used as-is; otherwise `adb devices` is consulted.
    pub async fn serial(&self) -> Result<&str, TransportError> {
        let serial = self
            .serial
            .get_or_try_init(|| async {
                if let Some(serial) = &self.pinned_serial {
                    return Ok(serial.clone());
                }
                let output = run_adb(&self.adb_cmd, &["devices"]).await?;
                if !output.success() {
                    return Err(TransportError::CommandFailed {
                        command: format!("{} devices", self.adb_cmd),
                        exit_code: output.exit_code,
                        stderr: output.stderr.trim().to_string(),
                    });
                }
                let serial = select_device(&parse_devices(&output.stdout))
                    .ok_or(TransportError::NoDevice)?;
                debug!(serial = %serial, "Using adb device");
                Ok(serial)
            })
            .await?;
        Ok(serial.as_str())
    }

    async fn run(&self, args: &[&str]) -> Result<AdbOutput, TransportError> {
        let serial = self.serial().await?;
        let mut full = vec!["-s", serial];
        full.extend_from_slice(args);
        run_adb(&self.adb_cmd, &full).await
    }

    /// Run `args` and fail unless adb exits cleanly.
    async fn run_checked(&self, args: &[&str]) -> Result<AdbOutput, TransportError> {
        let output = self.run(args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(TransportError::CommandFailed {
                command: format!("{} {}", self.adb_cmd, args.join(" ")),
                exit_code: output.exit_code,
                stderr: output.combined().trim().to_string(),
            })
        }
    }

    async fn shell(&self, command: &str) -> Result<AdbOutput, TransportError> {
        self.run(&["shell", command]).await
    }
}

#[async_trait]
impl Transport for AdbTransport {
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), TransportError> {
        if let Some(dir) = remote_parent(remote_path) {
            let mkdir = format!("mkdir -p {}", shell_quote(dir));
            let output = self.shell(&mkdir).await?;
            if !output.success() {
                return Err(TransportError::CommandFailed {
                    command: mkdir,
                    exit_code: output.exit_code,
                    stderr: output.combined().trim().to_string(),
                });
            }
        }

        let local = local_path.to_string_lossy();
        self.run_checked(&["push", &*local, remote_path]).await?;
        Ok(())
    }

    async fn download(&self, remote_path: &str, local_path: &Path) -> Result<(), TransportError> {
        let local = local_path.to_string_lossy();
        match self.run_checked(&["pull", remote_path, &*local]).await {
            Err(TransportError::CommandFailed { stderr, .. })
                if stderr.contains("does not exist") || stderr.contains(NO_SUCH_FILE) =>
            {
                Err(TransportError::RemoteMissing(remote_path.to_string()))
            }
            other => other.map(|_| ()),
        }
    }

    async fn exists(&self, remote_path: &str) -> Result<bool, TransportError> {
        let command = format!("ls {}", shell_quote(remote_path));
        let output = self.shell(&command).await?;
        if output.combined().contains(NO_SUCH_FILE) {
            return Ok(false);
        }
        if output.success() {
            Ok(true)
        } else {
            Err(TransportError::CommandFailed {
                command,
                exit_code: output.exit_code,
                stderr: output.combined().trim().to_string(),
            })
        }
    }

    async fn list_directory(&self, remote_dir: &str) -> Result<Vec<String>, TransportError> {
        let command = format!("ls {}", shell_quote(remote_dir));
        let output = self.shell(&command).await?;
        if output.combined().contains(NO_SUCH_FILE) {
            return Ok(Vec::new());
        }
        if !output.success() {
            return Err(TransportError::CommandFailed {
                command,
                exit_code: output.exit_code,
                stderr: output.combined().trim().to_string(),
            });
        }
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn open_in_viewer(&self, remote_path: &str) -> Result<(), TransportError> {
        let command = format!(
            "am start -a android.intent.action.VIEW -d {} -n {}",
            shell_quote(&format!("file://{}", sdcard_uri_path(remote_path))),
            self.viewer_component
        );
        let output = self.shell(&command).await?;
        // `am start` exits 0 even when the intent cannot be resolved.
        if !output.success() || output.combined().contains("Error") {
            return Err(TransportError::CommandFailed {
                command,
                exit_code: output.exit_code,
                stderr: output.combined().trim().to_string(),
            });
        }
        Ok(())
    }
}

async fn run_adb(adb_cmd: &str, args: &[&str]) -> Result<AdbOutput, TransportError> {
    debug!(command = adb_cmd, ?args, "Running adb");
    let output = Command::new(adb_cmd)
        .args(args)
        .output()
        .await
        .map_err(|source| TransportError::Spawn {
            command: adb_cmd.to_string(),
            source,
        })?;

    Ok(AdbOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Serials of attached devices in the `device` state, from `adb devices` output.
pub fn parse_devices(output: &str) -> Vec<String> {
    output
        .lines()
        .skip_while(|line| !line.starts_with("List of devices"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            (parts.next() == Some("device")).then(|| serial.to_string())
        })
        .collect()
}

/// Pick a device: the only one, else the first wireless (`host:port`) one, else the first.
pub fn select_device(serials: &[String]) -> Option<String> {
    match serials {
        [] => None,
        [only] => Some(only.clone()),
        many => many
            .iter()
            .find(|s| s.contains('.') && s.contains(':'))
            .or_else(|| many.first())
            .cloned(),
    }
}

/// Rewrite internal-storage paths to the `/sdcard/` form the viewer intent expects.
pub fn sdcard_uri_path(remote_path: &str) -> String {
    match remote_path.strip_prefix(STORAGE_ROOT) {
        Some(rest) => format!("{}{}", SDCARD_ROOT, rest),
        None => remote_path.to_string(),
    }
}

/// Single-quote an argument for the device shell.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}
