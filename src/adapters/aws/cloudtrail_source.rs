use std::sync::Arc;

use aws_sdk_cloudtrail::error::DisplayErrorContext;
use aws_sdk_cloudtrail::types::{Event, LookupAttribute, LookupAttributeKey};
use aws_smithy_types::DateTime;
use chrono::{TimeZone, Utc};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapters::aws::session::AwsSession;
use crate::core::errors::{MonitorError, Result};
use crate::core::models::audit_event::{AuditEvent, EventResource};
use crate::core::traits::event_source::{EventPage, EventSource, PageRequest};

/// Largest page the LookupEvents API returns.
pub const PAGE_SIZE: i32 = 50;

/// Event source backed by CloudTrail's LookupEvents API.
pub struct CloudTrailSource {
    client: aws_sdk_cloudtrail::Client,
    runtime: Arc<Runtime>,
    cancel: CancellationToken,
}

impl CloudTrailSource {
    pub fn new(session: &AwsSession, cancel: CancellationToken) -> Self {
        Self {
            client: aws_sdk_cloudtrail::Client::new(session.config()),
            runtime: session.runtime(),
            cancel,
        }
    }

    async fn lookup(&self, request: &PageRequest<'_>) -> Result<EventPage> {
        let mut lookup = self
            .client
            .lookup_events()
            .start_time(DateTime::from_millis(request.window.start().timestamp_millis()))
            .end_time(DateTime::from_millis(request.window.end().timestamp_millis()))
            .max_results(PAGE_SIZE);

        if let Some(source) = request.event_source {
            let attribute = LookupAttribute::builder()
                .attribute_key(LookupAttributeKey::EventSource)
                .attribute_value(source)
                .build()
                .map_err(|e| MonitorError::RetrievalFailed {
                    reason: format!("invalid lookup attribute: {e}"),
                })?;
            lookup = lookup.lookup_attributes(attribute);
        }
        if let Some(token) = request.next_token {
            lookup = lookup.next_token(token);
        }

        let response = lookup
            .send()
            .await
            .map_err(|e| MonitorError::RetrievalFailed {
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        let events = response.events().iter().filter_map(to_audit_event).collect();
        Ok(EventPage {
            events,
            next_token: response.next_token().map(str::to_string),
        })
    }
}

impl EventSource for CloudTrailSource {
    fn fetch_page(&self, request: &PageRequest<'_>) -> Result<EventPage> {
        debug!(
            start = %request.window.start(),
            end = %request.window.end(),
            continued = request.next_token.is_some(),
            "LookupEvents"
        );
        self.runtime.block_on(async {
            tokio::select! {
                page = self.lookup(request) => page,
                _ = self.cancel.cancelled() => Err(MonitorError::RetrievalFailed {
                    reason: "request cancelled".into(),
                }),
            }
        })
    }
}

/// Convert an SDK event. Records without a timestamp are dropped.
fn to_audit_event(event: &Event) -> Option<AuditEvent> {
    let Some(event_time) = event
        .event_time()
        .and_then(|dt| dt.to_millis().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    else {
        warn!(
            event_id = event.event_id().unwrap_or_default(),
            "dropping event without a timestamp"
        );
        return None;
    };

    let mut audit = AuditEvent::new(event_time);
    audit.event_name = event.event_name().map(str::to_string);
    audit.event_source = event.event_source().map(str::to_string);
    audit.username = event.username().map(str::to_string);
    audit.resources = event
        .resources()
        .iter()
        .map(|r| EventResource {
            resource_name: r.resource_name().map(str::to_string),
            resource_type: r.resource_type().map(str::to_string),
        })
        .collect();
    if let Some(raw) = event.cloud_trail_event() {
        audit = audit.with_raw_detail(raw);
    }
    Some(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudtrail::types::Resource;

    #[test]
    fn converts_sdk_event() {
        let event = Event::builder()
            .event_name("Decrypt")
            .event_source("kms.amazonaws.com")
            .username("admin")
            .event_time(DateTime::from_secs(1_732_093_200))
            .resources(
                Resource::builder()
                    .resource_type("AWS::KMS::Key")
                    .resource_name("arn:aws:kms:us-east-1:111122223333:key/1234abcd")
                    .build(),
            )
            .cloud_trail_event(r#"{"errorCode":"AccessDenied"}"#)
            .build();

        let audit = to_audit_event(&event).unwrap();
        assert_eq!(audit.event_name.as_deref(), Some("Decrypt"));
        assert_eq!(audit.username.as_deref(), Some("admin"));
        assert_eq!(audit.event_time, Utc.with_ymd_and_hms(2024, 11, 20, 9, 0, 0).unwrap());
        assert_eq!(
            audit.resources[0].describe(),
            "arn:aws:kms:us-east-1:111122223333:key/1234abcd (AWS::KMS::Key)"
        );
        assert!(audit.is_error());
    }

    #[test]
    fn missing_fields_stay_empty() {
        let event = Event::builder()
            .event_time(DateTime::from_secs(1_732_093_200))
            .build();
        let audit = to_audit_event(&event).unwrap();
        assert_eq!(audit.name_or_missing(), "N/A");
        assert!(audit.resources.is_empty());
        assert!(audit.details().is_none());
    }

    #[test]
    fn events_without_time_are_dropped() {
        let event = Event::builder().event_name("Decrypt").build();
        assert!(to_audit_event(&event).is_none());
    }
}
