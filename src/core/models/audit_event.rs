use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::MonitorError;
use crate::core::models::event_details::EventDetails;

/// Placeholder printed for any missing string field.
pub const MISSING: &str = "N/A";

/// A resource referenced by an event (e.g. a KMS key or S3 bucket).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    pub resource_name: Option<String>,
    pub resource_type: Option<String>,
}

impl EventResource {
    pub fn new(name: &str, resource_type: &str) -> Self {
        Self {
            resource_name: Some(name.to_string()),
            resource_type: Some(resource_type.to_string()),
        }
    }

    /// `name (type)` with `N/A` for missing parts.
    pub fn describe(&self) -> String {
        format!(
            "{} ({})",
            self.resource_name.as_deref().unwrap_or(MISSING),
            self.resource_type.as_deref().unwrap_or(MISSING)
        )
    }
}

/// One audit-log record as returned by the query service.
///
/// The pipeline treats it as read-only. The detail payload is parsed at
/// most once, on first access, and the result is cached.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub event_name: Option<String>,
    pub event_time: DateTime<Utc>,
    pub event_source: Option<String>,
    pub username: Option<String>,
    pub resources: Vec<EventResource>,
    pub raw_detail: Option<String>,
    parsed: OnceLock<Option<Result<EventDetails, String>>>,
}

impl AuditEvent {
    pub fn new(event_time: DateTime<Utc>) -> Self {
        Self {
            event_name: None,
            event_time,
            event_source: None,
            username: None,
            resources: Vec::new(),
            raw_detail: None,
            parsed: OnceLock::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.event_name = Some(name.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.event_source = Some(source.to_string());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_resource(mut self, resource: EventResource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_raw_detail(mut self, raw: &str) -> Self {
        self.raw_detail = Some(raw.to_string());
        self.parsed = OnceLock::new();
        self
    }

    /// Parsed detail document, or `None` when the payload is absent or
    /// could not be parsed.
    pub fn details(&self) -> Option<&EventDetails> {
        self.parsed_details().as_ref()?.as_ref().ok()
    }

    /// The parse failure for this event's payload, if any.
    pub fn detail_error(&self) -> Option<MonitorError> {
        match self.parsed_details() {
            Some(Err(reason)) => Some(MonitorError::DetailParseFailed {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    /// True when the detail document carries a non-empty error code.
    pub fn is_error(&self) -> bool {
        self.details().and_then(EventDetails::error_code).is_some()
    }

    pub fn name_or_missing(&self) -> &str {
        self.event_name.as_deref().unwrap_or(MISSING)
    }

    pub fn source_or_missing(&self) -> &str {
        self.event_source.as_deref().unwrap_or(MISSING)
    }

    pub fn username_or_missing(&self) -> &str {
        self.username.as_deref().unwrap_or(MISSING)
    }

    fn parsed_details(&self) -> &Option<Result<EventDetails, String>> {
        self.parsed.get_or_init(|| {
            self.raw_detail
                .as_deref()
                .map(|raw| EventDetails::parse(raw).map_err(|e| e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> AuditEvent {
        AuditEvent::new(Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap())
    }

    #[test]
    fn details_parse_lazily_and_cache() {
        let ev = event().with_raw_detail(r#"{"errorCode": "AccessDenied"}"#);
        assert!(ev.is_error());
        let first = ev.details().unwrap() as *const EventDetails;
        let second = ev.details().unwrap() as *const EventDetails;
        assert_eq!(first, second);
    }

    #[test]
    fn missing_payload_has_no_details_and_no_error() {
        let ev = event();
        assert!(ev.details().is_none());
        assert!(ev.detail_error().is_none());
        assert!(!ev.is_error());
    }

    #[test]
    fn malformed_payload_reports_parse_error() {
        let ev = event().with_raw_detail("{oops");
        assert!(ev.details().is_none());
        assert!(matches!(
            ev.detail_error(),
            Some(MonitorError::DetailParseFailed { .. })
        ));
    }

    #[test]
    fn missing_strings_render_as_placeholder() {
        let ev = event();
        assert_eq!(ev.name_or_missing(), "N/A");
        assert_eq!(ev.username_or_missing(), "N/A");
        let resource = EventResource {
            resource_name: Some("alias/app".into()),
            resource_type: None,
        };
        assert_eq!(resource.describe(), "alias/app (N/A)");
    }
}
