//! Integration tests for manta-review
//!
//! The binary is driven end to end against stand-in `adb` and `pandoc`
//! scripts configured through `.manta/manta.toml`. The fake adb maps device
//! paths into a local directory so uploads, exports and pulls can be inspected.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const STAGING: &str = "storage/emulated/0/Document/PDFs/ForReview";
const EXPORT: &str = "storage/emulated/0/EXPORT";

/// Helper to create a manta-review Command with a clean environment
fn manta() -> Command {
    let mut cmd = cargo_bin_cmd!("manta-review");
    cmd.env_remove("MANTA_ADB_CMD")
        .env_remove("MANTA_PANDOC_CMD")
        .env_remove("MANTA_DEVICE_SERIAL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        manta()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("review"))
            .stdout(predicate::str::contains("done"))
            .stdout(predicate::str::contains("serve"));
    }

    #[test]
    fn test_version() {
        manta().arg("--version").assert().success();
    }

    #[test]
    fn test_list_empty_project() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No pending reviews."));
    }

    #[test]
    fn test_list_all_empty_project() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .args(["list", "--all"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No reviews recorded."));
    }

    #[test]
    fn test_done_without_pending_reviews() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .arg("done")
            .assert()
            .success()
            .stdout(predicate::str::contains("No pending reviews found."));
    }

    #[test]
    fn test_corrupt_ledger_is_treated_as_empty() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".manta")).unwrap();
        fs::write(dir.path().join(".manta/state.json"), "{ not json").unwrap();

        manta()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No pending reviews."))
            .stderr(predicate::str::contains("Ledger is corrupt, treating as empty"));

        let backup = dir.path().join(".manta/state.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ not json");
    }

    #[test]
    fn test_unknown_record_status_keeps_other_reviews() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".manta")).unwrap();
        let document = r#"{
  "reviews": {
    "a.md": {
      "device_path": "/remote/a_20260101_000000.pdf",
      "status": "pending",
      "timestamp": "2026-01-01T00:00:00Z",
      "original_path": "/w/a.md"
    },
    "b.md": {
      "device_path": "/remote/b_20260101_000000.pdf",
      "status": "archived",
      "timestamp": "2026-01-01T00:00:00Z",
      "original_path": "/w/b.md"
    }
  }
}"#;
        fs::write(dir.path().join(".manta/state.json"), document).unwrap();

        manta()
            .current_dir(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("- a.md"))
            .stdout(predicate::str::contains("b.md").not())
            .stderr(predicate::str::contains("Ledger is partly corrupt"));

        let backup = dir.path().join(".manta/state.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), document);
    }
}

// =============================================================================
// Agent Integration Text
// =============================================================================

mod guide {
    use super::*;

    #[test]
    fn test_usage_prints_playbook() {
        manta()
            .arg("usage")
            .assert()
            .success()
            .stdout(predicate::str::contains("request_review(file_path)"))
            .stdout(predicate::str::contains("retrieve_review"));
    }

    #[test]
    fn test_tools_prints_valid_json() {
        let output = manta().arg("tools").output().unwrap();
        assert!(output.status.success());

        let schemas: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let names: Vec<_> = schemas
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["request_review", "retrieve_review", "list_reviews"]);
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No manta.toml found"))
            .stdout(predicate::str::contains("/storage/emulated/0/EXPORT"))
            .stdout(predicate::str::contains("serial = (auto-select)"));
    }

    #[test]
    fn test_config_init_creates_file_once() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created manta.toml"));

        let content = fs::read_to_string(dir.path().join(".manta/manta.toml")).unwrap();
        assert!(content.contains("[device]"));
        assert!(content.contains("[render]"));

        manta()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".manta")).unwrap();
        fs::write(
            dir.path().join(".manta/manta.toml"),
            "[device]\nstaging_dir = \"relative/dir\"\nexport_dir = \"relative/dir\"\n",
        )
        .unwrap();

        manta()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration warnings:"))
            .stdout(predicate::str::contains("absolute device path"))
            .stdout(predicate::str::contains("same directory"));
    }

    #[test]
    fn test_config_show_env_override() {
        let dir = create_temp_project();
        manta()
            .current_dir(dir.path())
            .env("MANTA_ADB_CMD", "/opt/platform-tools/adb")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "adb_cmd = \"/opt/platform-tools/adb\"",
            ));
    }

    #[test]
    fn test_malformed_config_fails() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".manta")).unwrap();
        fs::write(dir.path().join(".manta/manta.toml"), "[device\n").unwrap();

        manta()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse manta.toml"));
    }
}

// =============================================================================
// Review Round-Trip (fake adb + pandoc)
// =============================================================================

#[cfg(unix)]
mod round_trip {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A project wired to stand-in tools, with the device filesystem under `device/`.
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self::with_devices("192.168.1.20:5555\tdevice\n")
        }

        fn with_devices(device_lines: &str) -> Self {
            let dir = create_temp_project();
            let bin = dir.path().join("bin");
            let device = dir.path().join("device");
            fs::create_dir_all(&bin).unwrap();
            fs::create_dir_all(&device).unwrap();

            let adb = bin.join("adb");
            write_script(&adb, &fake_adb(&device, device_lines));
            let pandoc = bin.join("pandoc");
            write_script(&pandoc, FAKE_PANDOC);

            fs::create_dir_all(dir.path().join(".manta")).unwrap();
            fs::write(
                dir.path().join(".manta/manta.toml"),
                format!(
                    "[device]\nadb_cmd = \"{}\"\n\n[render]\npandoc_cmd = \"{}\"\n",
                    adb.display(),
                    pandoc.display()
                ),
            )
            .unwrap();

            fs::write(
                dir.path().join("notes.md"),
                "# Notes\n\nA paragraph worth reviewing.\n",
            )
            .unwrap();

            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn device_dir(&self, remote: &str) -> PathBuf {
            self.path().join("device").join(remote)
        }

        fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
            manta().current_dir(self.path()).args(args).assert()
        }

        /// File names uploaded to the staging directory.
        fn staged(&self) -> Vec<String> {
            list_names(&self.device_dir(STAGING))
        }

        /// Simulate the user exporting the staged upload under `name`.
        fn export(&self, staged_name: &str, name: &str) {
            let export = self.device_dir(EXPORT);
            fs::create_dir_all(&export).unwrap();
            fs::copy(self.device_dir(STAGING).join(staged_name), export.join(name)).unwrap();
        }

        fn ledger(&self) -> serde_json::Value {
            let raw = fs::read_to_string(self.path().join(".manta/state.json")).unwrap();
            serde_json::from_str(&raw).unwrap()
        }

        fn local_files_with_prefix(&self, prefix: &str) -> Vec<String> {
            list_names(self.path())
                .into_iter()
                .filter(|n| n.starts_with(prefix))
                .collect()
        }
    }

    fn list_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    fn write_script(path: &Path, body: &str) {
        fs::write(path, body).unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    /// adb stand-in: device paths are rooted at `root`.
    fn fake_adb(root: &Path, device_lines: &str) -> String {
        format!(
            r#"#!/bin/sh
ROOT='{root}'
if [ "$1" = "devices" ]; then
    printf 'List of devices attached\n{devices}'
    exit 0
fi
if [ "$1" = "-s" ]; then
    shift 2
fi
cmd="$1"
shift
case "$cmd" in
    push)
        mkdir -p "$ROOT$(dirname "$2")"
        cp "$1" "$ROOT$2"
        ;;
    pull)
        if [ -f "$ROOT$1" ]; then
            cp "$ROOT$1" "$2"
        else
            echo "adb: error: remote object '$1' does not exist" >&2
            exit 1
        fi
        ;;
    shell)
        eval "set -- $1"
        case "$1" in
            mkdir)
                mkdir -p "$ROOT$3"
                ;;
            ls)
                if [ -d "$ROOT$2" ]; then
                    ls -1 "$ROOT$2"
                elif [ -e "$ROOT$2" ]; then
                    echo "$2"
                else
                    echo "ls: $2: No such file or directory"
                    exit 1
                fi
                ;;
            am)
                echo "$@" >> "$ROOT/../viewer.log"
                echo "Starting: Intent {{ act=android.intent.action.VIEW }}"
                ;;
            *)
                exit 1
                ;;
        esac
        ;;
    *)
        exit 1
        ;;
esac
"#,
            root = root.display(),
            devices = device_lines.replace('\t', "\\t").replace('\n', "\\n"),
        )
    }

    /// pandoc stand-in: writes a PDF-looking copy of the source to `-o`.
    const FAKE_PANDOC: &str = r#"#!/bin/sh
src="$1"
out=""
while [ $# -gt 0 ]; do
    if [ "$1" = "-o" ]; then
        out="$2"
    fi
    shift
done
{ echo "%PDF-1.4 fake"; cat "$src"; } > "$out"
"#;

    #[test]
    fn test_review_list_done_exact_export() {
        let sandbox = Sandbox::new();

        sandbox
            .run(&["review", "notes.md"])
            .success()
            .stdout(predicate::str::contains("Sent notes.md for review."))
            .stderr(predicate::str::contains("[1/3]"));

        let staged = sandbox.staged();
        assert_eq!(staged.len(), 1);
        let upload = &staged[0];
        assert!(upload.starts_with("notes_") && upload.ends_with(".pdf"));
        assert_eq!(sandbox.local_files_with_prefix("notes_"), vec![upload.clone()]);

        let ledger = sandbox.ledger();
        let record = &ledger["reviews"]["notes.md"];
        assert_eq!(record["status"], "pending");
        assert!(
            record["device_path"]
                .as_str()
                .unwrap()
                .ends_with(&format!("/ForReview/{}", upload))
        );
        assert!(record.get("completed_at").is_none());

        let viewer = fs::read_to_string(sandbox.path().join("viewer.log")).unwrap();
        assert!(viewer.contains(&format!(
            "file:///sdcard/Document/PDFs/ForReview/{}",
            upload
        )));
        assert!(viewer.contains("com.supernote.document/.MainActivity"));

        sandbox
            .run(&["list"])
            .success()
            .stdout(predicate::str::contains("Pending Reviews:"))
            .stdout(predicate::str::contains("- notes.md (Out since:"));

        sandbox.export(upload, upload);

        sandbox
            .run(&["done", "notes"])
            .success()
            .stdout(predicate::str::contains("# Review: notes.md"))
            .stdout(predicate::str::contains(
                "Review completed on device. See annotated PDF for details.",
            ))
            .stderr(predicate::str::contains("Retrieved 1 review(s), 0 failed."));

        let pulled = sandbox.local_files_with_prefix("notes-reviewed-");
        assert_eq!(pulled.len(), 1);
        let summary = fs::read_to_string(sandbox.path().join("notes-review.md")).unwrap();
        assert!(summary.contains(&format!("[{0}]({0})", pulled[0])));

        assert_eq!(sandbox.ledger()["reviews"]["notes.md"]["status"], "completed");
        assert!(sandbox.ledger()["reviews"]["notes.md"]["completed_at"].is_string());

        sandbox
            .run(&["list"])
            .success()
            .stdout(predicate::str::contains("No pending reviews."));
        sandbox
            .run(&["list", "--all"])
            .success()
            .stdout(predicate::str::contains("notes.md [completed]"));
    }

    #[test]
    fn test_done_picks_renamed_export() {
        let sandbox = Sandbox::new();
        sandbox.run(&["review", "notes.md"]).success();
        let upload = sandbox.staged().remove(0);

        sandbox.export(&upload, "notes_20000101_000000.pdf");
        sandbox.export(&upload, "notes_29991231_235959.pdf");

        sandbox
            .run(&["done"])
            .success()
            .stdout(predicate::str::contains("# Review: notes.md"))
            .stderr(predicate::str::contains(
                "Found alternative: notes_29991231_235959.pdf",
            ));
    }

    #[test]
    fn test_done_without_export_pulls_original() {
        let sandbox = Sandbox::new();
        sandbox.run(&["review", "notes.md"]).success();

        sandbox
            .run(&["done"])
            .success()
            .stdout(predicate::str::contains("original upload was retrieved"))
            .stderr(predicate::str::contains(
                "No exported annotations found. Pulling original file.",
            ));

        let pulled = sandbox.local_files_with_prefix("notes-reviewed-");
        assert_eq!(pulled.len(), 1);
        let content = fs::read_to_string(sandbox.path().join(&pulled[0])).unwrap();
        assert!(content.starts_with("%PDF-1.4 fake"));
    }

    #[test]
    fn test_done_unmatched_pattern_leaves_ledger_alone() {
        let sandbox = Sandbox::new();
        sandbox.run(&["review", "notes.md"]).success();
        let before = sandbox.ledger();

        sandbox
            .run(&["done", "chapter"])
            .success()
            .stdout(predicate::str::contains("No pending review matching 'chapter'"));

        assert_eq!(sandbox.ledger(), before);
    }

    #[test]
    fn test_done_fails_when_every_retrieval_fails() {
        let sandbox = Sandbox::new();
        sandbox.run(&["review", "notes.md"]).success();
        fs::remove_dir_all(sandbox.path().join("device/storage")).unwrap();

        sandbox
            .run(&["done"])
            .failure()
            .stderr(predicate::str::contains("Retrieved 0 review(s), 1 failed."));

        assert_eq!(sandbox.ledger()["reviews"]["notes.md"]["status"], "pending");
        assert!(!sandbox.path().join("notes-review.md").exists());
    }

    #[test]
    fn test_review_missing_source_fails_without_record() {
        let sandbox = Sandbox::new();
        sandbox
            .run(&["review", "absent.md"])
            .failure()
            .stderr(predicate::str::contains("Source document not found"));

        assert!(!sandbox.path().join(".manta/state.json").exists());
        assert!(sandbox.staged().is_empty());
    }

    #[test]
    fn test_review_without_device_fails_without_record() {
        let sandbox = Sandbox::with_devices("");
        sandbox
            .run(&["review", "notes.md"])
            .failure()
            .stderr(predicate::str::contains("No ADB devices found"));

        assert!(!sandbox.path().join(".manta/state.json").exists());
    }

    #[test]
    fn test_serve_answers_tool_calls() {
        let sandbox = Sandbox::new();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"request_review","arguments":{"file_path":"notes.md"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"list_reviews","arguments":{}}}"#,
            "\n",
        );

        let output = manta()
            .current_dir(sandbox.path())
            .arg("serve")
            .write_stdin(input)
            .output()
            .unwrap();
        assert!(output.status.success());

        let responses: Vec<serde_json::Value> = String::from_utf8(output.stdout)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[1]["result"]["isError"], false);
        assert!(
            responses[2]["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .contains("- notes.md (Out since:")
        );
        assert_eq!(sandbox.ledger()["reviews"]["notes.md"]["status"], "pending");
    }
}
