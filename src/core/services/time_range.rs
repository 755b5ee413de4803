use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

use crate::core::errors::{MonitorError, Result};
use crate::core::models::time_window::{TimeSpec, TimeWindow};

const MAX_MINUTES: i64 = 1440;
const MAX_HOURS: i64 = 24;

/// Datetime layouts accepted for `--start`/`--end`, tried in order.
const DATETIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_LAYOUT: &str = "%Y-%m-%d";

fn relative_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)([mh])$").expect("static pattern is valid"))
}

/// Exact shape of the absolute layouts. chrono alone tolerates padding
/// before numeric fields.
fn absolute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}( \d{2}:\d{2}(:\d{2})?)?$").expect("static pattern is valid")
    })
}

/// Turns operator time input into a validated [`TimeWindow`].
pub struct TimeRangeResolver;

impl TimeRangeResolver {
    /// Resolve against the current clock.
    pub fn resolve(&self, spec: &TimeSpec) -> Result<TimeWindow> {
        self.resolve_at(spec, Utc::now())
    }

    /// Resolve with an explicit "now", for relative ranges.
    ///
    /// Exactly one of `last_n` or the `start`/`end` pair must be given.
    /// Absolute input is read as UTC. A date-only `end` covers the whole
    /// day (up to 23:59:59); a date-only `start` begins at midnight.
    pub fn resolve_at(&self, spec: &TimeSpec, now: DateTime<Utc>) -> Result<TimeWindow> {
        let last_n = spec.last_n.as_deref().filter(|s| !s.is_empty());
        let start = spec.start.as_deref().filter(|s| !s.is_empty());
        let end = spec.end.as_deref().filter(|s| !s.is_empty());

        match (last_n, start, end) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(MonitorError::InvalidArguments {
                detail: "cannot use --last-n with --start/--end".into(),
            }),
            (Some(last_n), None, None) => {
                let duration = parse_relative(last_n)?;
                TimeWindow::new(now - duration, now)
            }
            (None, Some(start), Some(end)) => {
                let (start, _) = parse_absolute(start, "start")?;
                let (end, date_only) = parse_absolute(end, "end")?;
                let end = if date_only {
                    end + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59)
                } else {
                    end
                };
                TimeWindow::new(start, end)
            }
            (None, Some(_), None) | (None, None, Some(_)) => Err(MonitorError::InvalidArguments {
                detail: "both --start and --end must be provided together".into(),
            }),
            (None, None, None) => Err(MonitorError::InvalidArguments {
                detail: "either --last-n or both --start and --end must be provided".into(),
            }),
        }
    }
}

/// Parse `<n>m` (1-1440) or `<n>h` (1-24). Surrounding whitespace is an error.
fn parse_relative(input: &str) -> Result<Duration> {
    let invalid = |detail: &str| MonitorError::InvalidTimeSpec {
        input: input.to_string(),
        detail: detail.to_string(),
    };

    let caps = relative_pattern()
        .captures(input)
        .ok_or_else(|| invalid("expected a number followed by 'm' or 'h'"))?;

    // Digits only, so the only possible failure is overflow.
    let value: i64 = caps[1]
        .parse()
        .map_err(|_| invalid("number is too large"))?;

    match &caps[2] {
        "m" if (1..=MAX_MINUTES).contains(&value) => Ok(Duration::minutes(value)),
        "m" => Err(invalid("minutes must be between 1 and 1440 (24 hours)")),
        "h" if (1..=MAX_HOURS).contains(&value) => Ok(Duration::hours(value)),
        _ => Err(invalid("hours must be between 1 and 24")),
    }
}

/// Parse one absolute bound. The flag is true when only a date was given.
///
/// Input must match a layout exactly: no surrounding or extra whitespace.
fn parse_absolute(input: &str, field: &'static str) -> Result<(DateTime<Utc>, bool)> {
    let invalid = || MonitorError::InvalidTimeFormat {
        field,
        input: input.to_string(),
    };

    if !absolute_pattern().is_match(input) {
        return Err(invalid());
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, layout) {
            return Ok((dt.and_utc(), false));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_LAYOUT) {
        return Ok((date.and_time(NaiveTime::MIN).and_utc(), true));
    }

    Err(invalid())
}
