use crate::core::models::audit_event::AuditEvent;
use crate::core::models::filter_criteria::FilterCriteria;
use crate::core::models::service_profile::ServiceProfile;

/// Decides whether an event matches a set of criteria.
///
/// All active criteria must pass; unset ones are vacuously satisfied.
/// Name and user checks are case-insensitive substrings. The identifier
/// and operation checks are case-sensitive, since ARNs and API names are.
pub struct FilterPredicate {
    profile: ServiceProfile,
}

impl FilterPredicate {
    pub fn new(profile: ServiceProfile) -> Self {
        Self { profile }
    }

    pub fn matches(&self, event: &AuditEvent, criteria: &FilterCriteria) -> bool {
        if let Some(id) = criteria.resource_id.as_deref()
            && !self.references(event, id)
        {
            return false;
        }

        if let Some(name) = criteria.event_name.as_deref()
            && !contains_ignore_case(event.event_name.as_deref(), name)
        {
            return false;
        }

        if let Some(user) = criteria.user_name.as_deref()
            && !contains_ignore_case(event.username.as_deref(), user)
        {
            return false;
        }

        if let Some(op) = criteria.operation.as_deref()
            && !event.event_name.as_deref().is_some_and(|n| n.contains(op))
        {
            return false;
        }

        if criteria.errors_only && !event.is_error() {
            return false;
        }

        if criteria.success_only && event.is_error() {
            return false;
        }

        true
    }

    /// True when the event names the identifier in a resource entry of the
    /// profile's type, or in the profile's request parameter.
    pub fn references(&self, event: &AuditEvent, id: &str) -> bool {
        let in_resources = event.resources.iter().any(|r| {
            r.resource_type.as_deref() == Some(self.profile.resource_type)
                && r.resource_name.as_deref().is_some_and(|n| n.contains(id))
        });
        if in_resources {
            return true;
        }

        event
            .details()
            .and_then(|d| d.request_parameter(self.profile.identifier_field))
            .is_some_and(|value| value.contains(id))
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}
