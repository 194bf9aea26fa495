//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use std::sync::mpsc;
use std::thread;

use comfy_table::{ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::directory::DirectoryReport;
use crate::core::progress::ProgressEvent;
use crate::errors::{NokvaultError, Result};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a two-column key/value table.
pub fn print_fields(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Field", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![name.to_string(), value.clone()]);
    }
    println!("{table}");
}

/// Run a directory job on a worker thread while the calling thread draws a
/// progress bar from the job's events.
pub fn run_with_progress<F>(job: F) -> Result<DirectoryReport>
where
    F: FnOnce(&mpsc::Sender<ProgressEvent>) -> Result<DirectoryReport> + Send,
{
    let (tx, rx) = mpsc::channel::<ProgressEvent>();

    let bar = ProgressBar::new(0);
    if let Ok(bar_style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {wide_msg}")
    {
        bar.set_style(bar_style.progress_chars("#>-"));
    }

    let joined = thread::scope(|scope| {
        let worker = scope.spawn(move || job(&tx));

        // The loop ends when the worker drops its sender.
        for event in rx {
            bar.set_length(event.total as u64);
            bar.set_position(event.current as u64);
            if event.is_failure() {
                bar.println(format!(
                    "{} {}",
                    style("\u{2717}").red().bold(),
                    event.relative_path
                ));
            }
            bar.set_message(event.relative_path);
        }
        worker.join()
    });
    bar.finish_and_clear();

    joined.map_err(|_| NokvaultError::CommandFailed("directory worker panicked".into()))?
}

/// Summarize a finished directory job, listing every failed file.
fn print_report(verb: &str, report: &DirectoryReport) {
    if report.total == 0 {
        info("No files to process.");
        return;
    }
    if report.failures.is_empty() {
        success(&format!("{verb} {} files", report.succeeded));
        return;
    }

    warning(&format!(
        "{verb} {} of {} files; {} failed:",
        report.succeeded,
        report.total,
        report.failures.len()
    ));
    for failure in &report.failures {
        eprintln!(
            "  {} {}: {}",
            style("-").red(),
            failure.relative_path.display(),
            failure.error
        );
    }
}

/// Print the report of a finished directory job and pass its error through.
pub fn finish_directory(result: Result<DirectoryReport>) -> Result<()> {
    match result {
        Ok(report) => {
            print_report("Processed", &report);
            Ok(())
        }
        Err(NokvaultError::BatchFailed { report }) => {
            print_report("Processed", &report);
            Err(NokvaultError::BatchFailed { report })
        }
        Err(e) => Err(e),
    }
}
