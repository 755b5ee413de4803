use crate::core::errors::{MonitorError, Result};

/// What the operator asked to see.
///
/// Built once from command-line input and passed by reference to the
/// filter. Empty strings are normalized to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub resource_id: Option<String>,
    pub event_name: Option<String>,
    pub user_name: Option<String>,
    pub operation: Option<String>,
    pub errors_only: bool,
    pub success_only: bool,
}

impl FilterCriteria {
    /// Validate and normalize criteria.
    ///
    /// Fails when `errors_only` and `success_only` are both set, or when no
    /// criterion is active and `scan_all` was not given.
    pub fn new(
        resource_id: Option<&str>,
        event_name: Option<&str>,
        user_name: Option<&str>,
        operation: Option<&str>,
        errors_only: bool,
        success_only: bool,
        scan_all: bool,
    ) -> Result<Self> {
        if errors_only && success_only {
            return Err(MonitorError::InvalidArguments {
                detail: "--errors-only and --success-only cannot be used together".into(),
            });
        }

        let criteria = Self {
            resource_id: non_empty(resource_id),
            event_name: non_empty(event_name),
            user_name: non_empty(user_name),
            operation: non_empty(operation),
            errors_only,
            success_only,
        };

        if !criteria.has_any() && !scan_all {
            return Err(MonitorError::InvalidArguments {
                detail: "at least one search criterion is required\n\n  \
                         Narrow the scan with --key/--bucket, --event, --user, --operation,\n  \
                         --errors-only or --success-only, or pass --all to list every event."
                    .into(),
            });
        }

        Ok(criteria)
    }

    /// Criteria that match every event.
    #[cfg(test)]
    pub fn unfiltered() -> Self {
        Self::default()
    }

    pub fn has_any(&self) -> bool {
        self.resource_id.is_some()
            || self.event_name.is_some()
            || self.user_name.is_some()
            || self.operation.is_some()
            || self.errors_only
            || self.success_only
    }

    /// One line per active criterion, for the run header.
    pub fn describe(&self, resource_label: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(id) = &self.resource_id {
            lines.push(format!("{resource_label}: {id}"));
        }
        if let Some(name) = &self.event_name {
            lines.push(format!("Event Name: {name}"));
        }
        if let Some(user) = &self.user_name {
            lines.push(format!("User: {user}"));
        }
        if let Some(op) = &self.operation {
            lines.push(format!("Operation: {op}"));
        }
        if self.errors_only {
            lines.push("Showing only errors".into());
        }
        if self.success_only {
            lines.push("Showing only successful operations".into());
        }
        lines
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
