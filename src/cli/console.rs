use std::cell::RefCell;
use std::path::PathBuf;

use colored::Colorize;
use indicatif::ProgressBar;

use crate::cli::output;
use crate::core::errors::MonitorError;
use crate::core::models::audit_event::{AuditEvent, MISSING};
use crate::core::models::event_details::display_value;
use crate::core::models::filter_criteria::FilterCriteria;
use crate::core::models::run_summary::RunSummary;
use crate::core::models::service_profile::{ExportFormat, ServiceProfile};
use crate::core::models::time_window::{TIMESTAMP_FORMAT, TimeWindow};
use crate::core::traits::scan_reporter::ScanReporter;

const SEPARATOR_WIDTH: usize = 80;

/// Terminal reporter: run header, one block per matched event, footer.
pub struct ConsoleReporter {
    profile: ServiceProfile,
    destination: PathBuf,
    export: Option<ExportFormat>,
    quiet: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    /// `export` is set when the operator named an explicit export file.
    pub fn new(
        profile: ServiceProfile,
        destination: PathBuf,
        export: Option<ExportFormat>,
        quiet: bool,
    ) -> Self {
        Self {
            profile,
            destination,
            export,
            quiet,
            spinner: RefCell::new(None),
        }
    }

    /// Print above the spinner without tearing it.
    fn print(&self, text: &str) {
        match self.spinner.borrow().as_ref() {
            Some(sp) => sp.suspend(|| print!("{text}")),
            None => print!("{text}"),
        }
    }

    fn stop_spinner(&self) {
        if let Some(sp) = self.spinner.borrow_mut().take() {
            sp.finish_and_clear();
        }
    }
}

impl ScanReporter for ConsoleReporter {
    fn scan_started(&self, window: &TimeWindow, criteria: &FilterCriteria) {
        if self.quiet {
            return;
        }
        print!("{}", render_header(self.profile, window, criteria, &self.destination));
        *self.spinner.borrow_mut() = Some(output::spinner("Fetching CloudTrail events..."));
    }

    fn page_fetched(&self, page: usize, events: usize) {
        if let Some(sp) = self.spinner.borrow().as_ref() {
            sp.set_message(format!("Scanned page {page} ({events} events)"));
        }
    }

    fn event_matched(&self, event: &AuditEvent, criteria: &FilterCriteria) {
        if self.quiet {
            return;
        }
        self.print(&render_event(event, criteria, target_marker(self.profile)));
    }

    fn warning(&self, error: &MonitorError) {
        if self.quiet {
            return;
        }
        let msg = format!("Warning: {error}");
        match self.spinner.borrow().as_ref() {
            Some(sp) => sp.suspend(|| output::warning(&msg)),
            None => output::warning(&msg),
        }
    }

    fn scan_finished(&self, summary: &RunSummary) {
        self.stop_spinner();
        if self.quiet {
            return;
        }

        if summary.interrupted {
            output::warning(&format!(
                "Scan interrupted after {} pages ({} events scanned)",
                summary.pages_scanned, summary.events_scanned
            ));
        }
        if summary.matched == 0 {
            println!();
            output::warning("No events found matching the specified filters");
        } else {
            println!();
            output::success(&format!("Found {} matching events", summary.matched));
        }
        if summary.write_failures > 0 {
            output::warning(&format!(
                "{} events could not be written to {}",
                summary.write_failures,
                self.destination.display()
            ));
        }
        if let Some(format) = self.export {
            output::field("Events exported to", &self.destination.display().to_string());
            output::field("Format", &format.to_string());
        }
    }
}

/// `(Target Key)` for KMS, `(Target Bucket)` for S3.
fn target_marker(profile: ServiceProfile) -> String {
    let noun = profile
        .identifier_label
        .rsplit(' ')
        .next()
        .unwrap_or(profile.identifier_label);
    format!("(Target {noun})")
}

fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Active filters, window with duration, destination file.
pub fn render_header(
    profile: ServiceProfile,
    window: &TimeWindow,
    criteria: &FilterCriteria,
    destination: &std::path::Path,
) -> String {
    let mut lines = vec![String::new(), "Active Filters:".bold().to_string()];
    let filters = criteria.describe(profile.identifier_label);
    if filters.is_empty() {
        lines.push(format!("- All {} events", profile.tag.to_uppercase()));
    }
    lines.extend(filters.into_iter().map(|line| format!("- {line}")));
    lines.push(String::new());
    lines.push(format!(
        "Time range: {} to {} ({})",
        window.start().format(TIMESTAMP_FORMAT),
        window.end().format(TIMESTAMP_FORMAT),
        window.describe_duration()
    ));
    lines.push(format!("Output file: {}", destination.display()));
    lines.push(separator());
    join_lines(lines)
}

/// One matched event as printed to the terminal.
pub fn render_event(event: &AuditEvent, criteria: &FilterCriteria, marker: String) -> String {
    let name = if event.is_error() {
        event.name_or_missing().red()
    } else {
        event.name_or_missing().green()
    };
    let mut lines = vec![
        format!("[{}] {}", event.event_time.format(TIMESTAMP_FORMAT), name),
        format!("  User: {}", event.username_or_missing()),
    ];

    if !event.resources.is_empty() {
        lines.push("  Resources:".to_string());
        for resource in &event.resources {
            let is_target = criteria.resource_id.as_deref().is_some_and(|id| {
                resource
                    .resource_name
                    .as_deref()
                    .is_some_and(|name| name.contains(id))
            });
            if is_target {
                lines.push(format!("    - {} {}", resource.describe(), marker.yellow()));
            } else {
                lines.push(format!("    - {}", resource.describe()));
            }
        }
    }

    if let Some(details) = event.details() {
        if let Some(params) = details.request_parameters() {
            lines.push("  Request Parameters:".to_string());
            for (key, value) in params.iter().filter(|(_, v)| !v.is_null()) {
                lines.push(format!("    {key}: {}", display_value(value)));
            }
        }
        if let Some(code) = details.error_code() {
            let line = format!(
                "  Error: {code} - {}",
                details.error_message().unwrap_or(MISSING)
            );
            lines.push(line.red().to_string());
        }
    }

    lines.push(separator());
    join_lines(lines)
}

/// Newline-terminated block.
fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
