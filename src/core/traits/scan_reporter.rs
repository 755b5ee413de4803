use crate::core::errors::MonitorError;
use crate::core::models::audit_event::AuditEvent;
use crate::core::models::filter_criteria::FilterCriteria;
use crate::core::models::run_summary::RunSummary;
use crate::core::models::time_window::TimeWindow;

/// Port for operator-facing progress.
///
/// Every method has a no-op default so tests and quiet callers implement
/// only what they need.
pub trait ScanReporter {
    /// The window is resolved and scanning is about to start.
    fn scan_started(&self, _window: &TimeWindow, _criteria: &FilterCriteria) {}

    /// A page was fetched.
    fn page_fetched(&self, _page: usize, _events: usize) {}

    /// An event passed the filter.
    fn event_matched(&self, _event: &AuditEvent, _criteria: &FilterCriteria) {}

    /// A failure while handling one event. The scan carries on.
    fn warning(&self, _error: &MonitorError) {}

    /// The scan finished (possibly interrupted).
    fn scan_finished(&self, _summary: &RunSummary) {}
}

/// Reporter that discards everything.
#[cfg(test)]
pub struct SilentReporter;

#[cfg(test)]
impl ScanReporter for SilentReporter {}
