//! The review round-trip commands: `review`, `done` and `list`.

use anyhow::{Result, bail};
use manta_review::ledger::{Ledger, ReviewRecord};
use manta_review::orchestrator::{Retrieval, ReviewOrchestrator, render_pending};
use manta_review::review_config::ReviewConfig;
use manta_review::ui::ReviewUI;
use manta_review::ui::icons::{DOCUMENT, INBOX};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Cli;

fn orchestrator(cli: &Cli, project_dir: PathBuf) -> Result<(ReviewOrchestrator, Arc<ReviewUI>)> {
    let config = ReviewConfig::with_cli_args(project_dir, cli.verbose, cli.serial.clone())?;
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
    let ui = Arc::new(ReviewUI::new(cli.verbose));
    let orchestrator = ReviewOrchestrator::from_config(&config).with_ui(Arc::clone(&ui));
    Ok((orchestrator, ui))
}

pub async fn cmd_review(cli: &Cli, project_dir: PathBuf, path: &str) -> Result<()> {
    let (orchestrator, ui) = orchestrator(cli, project_dir)?;
    ui.detail(&format!("{}Input: {}", DOCUMENT, path));

    match orchestrator.submit_for_review(path).await {
        Ok(submission) => {
            ui.success("Document is open for review.");
            ui.finish();
            println!("{}", submission.render());
            Ok(())
        }
        Err(e) => {
            ui.fail("Review was not sent.");
            ui.finish();
            Err(e.into())
        }
    }
}

pub async fn cmd_done(cli: &Cli, project_dir: PathBuf, pattern: Option<&str>) -> Result<()> {
    let (orchestrator, ui) = orchestrator(cli, project_dir)?;
    let retrieval = orchestrator.retrieve_reviews(pattern).await;

    let report = match retrieval {
        Retrieval::NothingToDo { message } => {
            ui.finish();
            println!("{}", message);
            return Ok(());
        }
        Retrieval::Processed(report) => report,
    };

    for (_, review) in report.succeeded() {
        ui.detail(&format!(
            "{}Created review report: {}",
            INBOX,
            review.summary_path.display()
        ));
    }
    ui.finish();

    for (_, review) in report.succeeded() {
        println!("{}", review.summary);
    }
    eprintln!("{}", report.tally());

    if report.all_failed() {
        bail!("No review could be retrieved");
    }
    Ok(())
}

pub fn cmd_list(project_dir: &Path, all: bool) -> Result<()> {
    let config = ReviewConfig::new(project_dir.to_path_buf())?;
    let ledger = Ledger::open(config.state_file());

    if all {
        println!("{}", render_all(&ledger.all()));
    } else {
        println!("{}", render_pending(&ledger.list_pending()));
    }
    Ok(())
}

fn render_all(records: &BTreeMap<String, ReviewRecord>) -> String {
    if records.is_empty() {
        return "No reviews recorded.".to_string();
    }
    let mut out = String::from("Reviews:");
    for (key, record) in records {
        let since = record.submitted_at.format("%Y-%m-%d %H:%M");
        match record.completed_at {
            Some(done) => out.push_str(&format!(
                "\n- {} [{}] sent {}, retrieved {}",
                key,
                record.status,
                since,
                done.format("%Y-%m-%d %H:%M")
            )),
            None => out.push_str(&format!("\n- {} [{}] sent {}", key, record.status, since)),
        }
    }
    out
}
