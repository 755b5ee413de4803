/// Counters accumulated over one scan and reported once at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Events that passed the filter.
    pub matched: usize,
    /// Pages requested from the query service.
    pub pages_scanned: usize,
    /// Raw events seen across all pages.
    pub events_scanned: usize,
    /// Matched events the sink failed to persist.
    pub write_failures: usize,
    /// The scan stopped early on a cancellation request.
    pub interrupted: bool,
}
