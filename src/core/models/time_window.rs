use chrono::{DateTime, Duration, Utc};

use crate::core::errors::{MonitorError, Result};

/// Longest window a single scan may cover, in hours.
pub const MAX_WINDOW_HOURS: i64 = 24;

/// Display format shared by the console, the text export and error messages.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A validated `[start, end)` range bounding one scan.
///
/// Construction is the only place the bounds are checked, so every
/// `TimeWindow` in the program satisfies `start <= end` and
/// `end - start <= 24h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(MonitorError::InvalidTimeRange {
                start: start.format(TIMESTAMP_FORMAT).to_string(),
                end: end.format(TIMESTAMP_FORMAT).to_string(),
            });
        }
        if end - start > Duration::hours(MAX_WINDOW_HOURS) {
            return Err(MonitorError::RangeTooLarge {
                start: start.format(TIMESTAMP_FORMAT).to_string(),
                end: end.format(TIMESTAMP_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Human-readable span rounded to the minute: `2h 30m`, `45m`, `0m`.
    pub fn describe_duration(&self) -> String {
        let minutes = (self.duration().num_seconds() + 30) / 60;
        let (hours, minutes) = (minutes / 60, minutes % 60);

        let mut parts = Vec::new();
        if hours > 0 {
            parts.push(format!("{hours}h"));
        }
        if minutes > 0 {
            parts.push(format!("{minutes}m"));
        }
        if parts.is_empty() {
            "0m".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT)
        )
    }
}

/// Raw time-range input as typed by the operator.
///
/// Either `last_n` alone, or `start` and `end` together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSpec {
    pub last_n: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[cfg(test)]
impl TimeSpec {
    pub fn relative(last_n: &str) -> Self {
        Self {
            last_n: Some(last_n.to_string()),
            ..Self::default()
        }
    }

    pub fn absolute(start: &str, end: &str) -> Self {
        Self {
            last_n: None,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        }
    }
}
