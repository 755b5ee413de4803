use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::errors::Result;
use crate::core::models::filter_criteria::FilterCriteria;
use crate::core::models::run_summary::RunSummary;
use crate::core::models::service_profile::ServiceProfile;
use crate::core::models::time_window::TimeWindow;
use crate::core::services::filter::FilterPredicate;
use crate::core::services::page_consumer::PageConsumer;
use crate::core::traits::event_sink::EventSink;
use crate::core::traits::event_source::EventSource;
use crate::core::traits::scan_reporter::ScanReporter;

/// Lifecycle of one run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Initializing,
    Scanning,
    Draining,
    Done,
}

/// Runs one scan over a resolved window: page through events, filter
/// them, and forward matches to the sink and the reporter.
///
/// The window comes from [`TimeRangeResolver`] and is resolved exactly
/// once, before authentication, so a bad range fails without any AWS
/// call and the scanned window is the one that was validated.
///
/// [`TimeRangeResolver`]: crate::core::services::time_range::TimeRangeResolver
///
/// The same service handles every monitored AWS service; only the
/// [`ServiceProfile`] changes.
pub struct MonitorService<'a> {
    profile: ServiceProfile,
    sink: &'a dyn EventSink,
    reporter: &'a dyn ScanReporter,
    cancel: CancellationToken,
}

impl<'a> MonitorService<'a> {
    pub fn new(
        profile: ServiceProfile,
        sink: &'a dyn EventSink,
        reporter: &'a dyn ScanReporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            profile,
            sink,
            reporter,
            cancel,
        }
    }

    /// Execute the scan.
    ///
    /// Page retrieval failures are returned. Detail parse failures and
    /// sink write failures are reported as warnings and the scan carries
    /// on. Zero matches is a normal outcome.
    pub fn run(
        &self,
        source: &dyn EventSource,
        window: &TimeWindow,
        criteria: &FilterCriteria,
    ) -> Result<RunSummary> {
        let mut state = ScanState::Initializing;

        advance(&mut state, ScanState::Scanning);
        info!(
            service = self.profile.tag,
            window = %window,
            destination = %self.sink.current_destination().display(),
            "starting scan"
        );
        self.reporter.scan_started(window, criteria);

        let predicate = FilterPredicate::new(self.profile);
        let consumer = PageConsumer::new(source, self.cancel.clone())
            .with_event_source(self.profile.event_source);

        let mut matched = 0;
        let mut write_failures = 0;
        let mut summary = consumer.for_each_event(window, self.reporter, |event| {
            if !predicate.matches(&event, criteria) {
                return Ok(());
            }
            matched += 1;

            if let Some(err) = event.detail_error() {
                warn!(event_name = event.name_or_missing(), error = %err, "unreadable event details");
                self.reporter.warning(&err);
            }

            let written = self.sink.write(&event, event.details());
            self.reporter.event_matched(&event, criteria);
            if written.is_err() {
                write_failures += 1;
            }
            written
        })?;

        advance(&mut state, ScanState::Draining);
        summary.matched = matched;
        summary.write_failures = write_failures;

        advance(&mut state, ScanState::Done);
        info!(
            matched = summary.matched,
            pages = summary.pages_scanned,
            events = summary.events_scanned,
            interrupted = summary.interrupted,
            "scan finished"
        );
        self.reporter.scan_finished(&summary);
        Ok(summary)
    }
}

fn advance(state: &mut ScanState, next: ScanState) {
    debug!(from = ?state, to = ?next, "scan state");
    *state = next;
}
