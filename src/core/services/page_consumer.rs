use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::errors::{MonitorError, Result};
use crate::core::models::audit_event::AuditEvent;
use crate::core::models::run_summary::RunSummary;
use crate::core::models::time_window::TimeWindow;
use crate::core::traits::event_source::{EventSource, PageRequest};
use crate::core::traits::scan_reporter::ScanReporter;

/// Drives continuation-token pagination and hands events out one by one.
pub struct PageConsumer<'a> {
    source: &'a dyn EventSource,
    event_source_filter: Option<&'a str>,
    cancel: CancellationToken,
}

impl<'a> PageConsumer<'a> {
    pub fn new(source: &'a dyn EventSource, cancel: CancellationToken) -> Self {
        Self {
            source,
            event_source_filter: None,
            cancel,
        }
    }

    /// Only request events emitted by `event_source` (e.g. `kms.amazonaws.com`).
    pub fn with_event_source(mut self, event_source: &'a str) -> Self {
        self.event_source_filter = Some(event_source);
        self
    }

    /// Invoke `callback` once per event across every page in `window`.
    ///
    /// A failed page request aborts with `RetrievalFailed`. An error from
    /// `callback` never stops the scan: it is logged, reported as a warning
    /// and the event is skipped. Errors that would be fatal elsewhere are
    /// logged at error level. Cancellation is checked before each page and
    /// each event; a cancelled scan returns the counters so far with
    /// `interrupted` set.
    pub fn for_each_event<F>(
        &self,
        window: &TimeWindow,
        reporter: &dyn ScanReporter,
        mut callback: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(AuditEvent) -> Result<()>,
    {
        let mut summary = RunSummary::default();
        let mut next_token: Option<String> = None;

        loop {
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let request = PageRequest {
                window,
                event_source: self.event_source_filter,
                next_token: next_token.as_deref(),
            };

            let page = match self.source.fetch_page(&request) {
                Ok(page) => page,
                // A request abandoned because of cancellation is not a failure.
                Err(_) if self.cancel.is_cancelled() => {
                    summary.interrupted = true;
                    break;
                }
                Err(e @ MonitorError::RetrievalFailed { .. }) => return Err(e),
                Err(other) => {
                    return Err(MonitorError::RetrievalFailed {
                        reason: other.to_string(),
                    });
                }
            };

            summary.pages_scanned += 1;
            debug!(
                page = summary.pages_scanned,
                events = page.events.len(),
                has_more = page.next_token.is_some(),
                "fetched page"
            );
            reporter.page_fetched(summary.pages_scanned, page.events.len());

            for event in page.events {
                if self.cancel.is_cancelled() {
                    summary.interrupted = true;
                    return Ok(summary);
                }
                summary.events_scanned += 1;
                if let Err(e) = callback(event) {
                    if e.is_fatal() {
                        error!(error = %e, "event handler failed, skipping event");
                    } else {
                        warn!(error = %e, "skipping event");
                    }
                    reporter.warning(&e);
                }
            }

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(summary)
    }
}
