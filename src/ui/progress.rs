use crate::ui::icons::{CHECK, CROSS, WARN};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal feedback for a review round-trip, rendered on stderr.
///
/// A single spinner shows the step in flight; finished steps, warnings and
/// failures are printed above it. Stdout is left untouched so summaries can be
/// piped to an agent.
pub struct ReviewUI {
    spinner: ProgressBar,
    verbose: bool,
}

impl ReviewUI {
    pub fn new(verbose: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .expect("progress bar template is a valid static string"),
        );
        Self { spinner, verbose }
    }

    /// Print a line above the spinner, or straight to stderr when it is hidden.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.spinner.is_hidden() {
            eprintln!("{}", msg.as_ref());
        } else {
            self.spinner.println(msg.as_ref());
        }
    }

    /// Start a numbered step, e.g. `[1/3] Converting Markdown to PDF...`.
    pub fn start_step(&self, index: usize, total: usize, msg: &str) {
        let line = format!("{} {}", style(format!("[{}/{}]", index, total)).bold().dim(), msg);
        self.spinner.set_message(line.clone());
        self.spinner.enable_steady_tick(Duration::from_millis(100));
        if self.spinner.is_hidden() {
            eprintln!("{}", line);
        }
    }

    /// Dim detail line, shown only in verbose mode.
    pub fn log_step(&self, msg: &str) {
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }

    /// Indented detail line, always shown.
    pub fn detail(&self, msg: &str) {
        self.print_line(format!("  -> {}", msg));
    }

    pub fn success(&self, msg: &str) {
        self.print_line(format!("{}{}", CHECK, style(msg).green()));
    }

    pub fn warn(&self, msg: &str) {
        self.print_line(format!("{}{}", WARN, style(msg).yellow()));
    }

    pub fn fail(&self, msg: &str) {
        self.print_line(format!("{}{}", CROSS, style(msg).red()));
    }

    /// Stop and clear the spinner.
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for ReviewUI {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
