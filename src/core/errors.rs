use std::path::PathBuf;

/// All domain errors for trailwatch.
///
/// Each variant names the offending input and what to do about it,
/// so the operator never has to read a raw SDK error to recover.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Invalid arguments: {detail}")]
    InvalidArguments { detail: String },

    #[error(
        "Invalid time range '{input}': {detail}\n\n  \
         Use a relative range with --last-n:\n    \
         → Minutes: e.g. '5m' for the last 5 minutes (1-1440)\n    \
         → Hours:   e.g. '2h' for the last 2 hours (1-24)\n  \
         Maximum allowed: 24h"
    )]
    InvalidTimeSpec { input: String, detail: String },

    #[error(
        "Invalid {field} time '{input}'\n\n  \
         Use one of:\n    \
         → YYYY-MM-DD HH:mm:ss\n    \
         → YYYY-MM-DD HH:mm\n    \
         → YYYY-MM-DD (start at midnight, end at 23:59:59)"
    )]
    InvalidTimeFormat { field: &'static str, input: String },

    #[error(
        "End time cannot be before start time ({start} → {end})\n\n  \
         Swap --start and --end, or use --last-n for a relative range."
    )]
    InvalidTimeRange { start: String, end: String },

    #[error(
        "Time range cannot exceed 24 hours ({start} → {end})\n\n  \
         Split the scan into several runs of at most 24h each."
    )]
    RangeTooLarge { start: String, end: String },

    #[error(
        "AWS authentication failed for profile '{profile}': {reason}\n\n  \
         Possible solutions:\n    \
         → Run 'aws configure' to set up your credentials\n    \
         → Check that the profile exists in ~/.aws/credentials or ~/.aws/config\n    \
         → Ensure your credentials are not expired\n    \
         → List known profiles: trailwatch profiles"
    )]
    AuthFailure { profile: String, reason: String },

    #[error(
        "AWS profile '{profile}' not found\n\n  \
         Available profiles: {available}\n  \
         Pass one of them with --profile, or run 'aws configure --profile {profile}'."
    )]
    ProfileNotFound { profile: String, available: String },

    #[error(
        "Failed to retrieve CloudTrail events: {reason}\n\n  \
         No events past this point were scanned. Check your network and\n  \
         permissions (cloudtrail:LookupEvents), then run the command again."
    )]
    RetrievalFailed { reason: String },

    #[error("Failed to parse event details: {reason}")]
    DetailParseFailed { reason: String },

    #[error("Failed to write event to {path}: {reason}")]
    SinkWriteFailed { path: PathBuf, reason: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Per-event failures are expected during a scan. Everything else
    /// aborts the run when raised outside the per-event handler.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MonitorError::DetailParseFailed { .. } | MonitorError::SinkWriteFailed { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MonitorError>;
