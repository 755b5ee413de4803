use crate::core::errors::Result;
use crate::core::models::audit_event::AuditEvent;
use crate::core::models::time_window::TimeWindow;

/// One bounded request against the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub window: &'a TimeWindow,
    /// Only return events emitted by this `eventSource`.
    pub event_source: Option<&'a str>,
    /// Continuation token from the previous page, `None` for the first.
    pub next_token: Option<&'a str>,
}

/// One response page. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<AuditEvent>,
    pub next_token: Option<String>,
}

/// Port for the audit-log query service.
///
/// Implementations own transport, retries and authentication; callers only
/// see pages of events in the service's own order.
pub trait EventSource: Send + Sync {
    /// Fetch a single page.
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<EventPage>;
}
