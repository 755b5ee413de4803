use std::path::PathBuf;

use crate::core::errors::Result;
use crate::core::models::audit_event::AuditEvent;
use crate::core::models::event_details::EventDetails;

/// Port for durable event persistence.
///
/// `write` must be safe to call from several threads at once; each call
/// appends one whole record or nothing.
pub trait EventSink: Send + Sync {
    /// Append one event with its parsed detail document.
    fn write(&self, event: &AuditEvent, details: Option<&EventDetails>) -> Result<()>;

    /// The file the next write will land in.
    fn current_destination(&self) -> PathBuf;
}
