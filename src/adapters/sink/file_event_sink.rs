use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::errors::{MonitorError, Result};
use crate::core::models::audit_event::{AuditEvent, EventResource};
use crate::core::models::event_details::{EventDetails, display_value};
use crate::core::models::service_profile::ExportFormat;
use crate::core::models::time_window::TIMESTAMP_FORMAT;
use crate::core::traits::event_sink::EventSink;

/// Width of the dashed line closing every text record.
pub const SEPARATOR_WIDTH: usize = 80;

/// Appends matched events to a log file.
///
/// Without an explicit export file, events go to
/// `{output_dir}/{tag}/{tag}-events-{YYYY-MM-DD}.log`, where the date is
/// taken at write time, so a long-running process rolls over to a new file
/// each day.
///
/// Writes are serialized by an internal lock: each call renders the whole
/// record first, then opens, appends and flushes under the lock, so records
/// from concurrent callers never interleave.
pub struct FileEventSink {
    output_dir: PathBuf,
    service_tag: String,
    custom_file: Option<PathBuf>,
    format: ExportFormat,
    write_lock: Mutex<()>,
}

impl FileEventSink {
    /// Create the sink, its directory and today's destination file.
    pub fn new(
        output_dir: &Path,
        service_tag: &str,
        custom_file: Option<&Path>,
        format: ExportFormat,
    ) -> Result<Self> {
        let dir = match custom_file {
            Some(file) => file.parent().map(Path::to_path_buf).unwrap_or_default(),
            None => output_dir.join(service_tag),
        };
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir).map_err(|e| MonitorError::InvalidConfig {
                detail: format!("Cannot create output directory {}: {e}", dir.display()),
            })?;
        }

        let sink = Self {
            output_dir: output_dir.to_path_buf(),
            service_tag: service_tag.to_string(),
            custom_file: custom_file.map(Path::to_path_buf),
            format,
            write_lock: Mutex::new(()),
        };

        let path = sink.current_destination();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| MonitorError::InvalidConfig {
                detail: format!("Cannot create output file {}: {e}", path.display()),
            })?;

        Ok(sink)
    }

    /// Whether an explicit export file was configured.
    pub fn is_custom(&self) -> bool {
        self.custom_file.is_some()
    }

    /// Destination for a given calendar day.
    pub fn path_for_date(&self, date: NaiveDate) -> PathBuf {
        match &self.custom_file {
            Some(file) => file.clone(),
            None => self.output_dir.join(&self.service_tag).join(format!(
                "{tag}-events-{date}.log",
                tag = self.service_tag,
                date = date.format("%Y-%m-%d")
            )),
        }
    }

    fn render(&self, event: &AuditEvent, details: Option<&EventDetails>) -> Result<String> {
        match self.format {
            ExportFormat::Text => Ok(render_text(event, details)),
            ExportFormat::Json => {
                render_json(event, details).map_err(|e| MonitorError::SinkWriteFailed {
                    path: self.current_destination(),
                    reason: format!("Failed to serialize event: {e}"),
                })
            }
        }
    }
}

impl EventSink for FileEventSink {
    fn write(&self, event: &AuditEvent, details: Option<&EventDetails>) -> Result<()> {
        let content = self.render(event, details)?;

        // The lock guards no data, so a poisoned lock is still usable.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = self.current_destination();
        let failed = |e: std::io::Error| MonitorError::SinkWriteFailed {
            path: path.clone(),
            reason: e.to_string(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(failed)?;
        file.write_all(content.as_bytes()).map_err(failed)?;
        file.flush().map_err(failed)?;

        Ok(())
    }

    fn current_destination(&self) -> PathBuf {
        self.path_for_date(Local::now().date_naive())
    }
}

/// Fixed text block: header line, source, user, resources, request
/// parameters and response elements, then a dashed separator.
pub fn render_text(event: &AuditEvent, details: Option<&EventDetails>) -> String {
    let mut lines = vec![
        format!(
            "[{}] {}",
            event.event_time.format(TIMESTAMP_FORMAT),
            event.name_or_missing()
        ),
        format!("Source: {}", event.source_or_missing()),
        format!("User: {}", event.username_or_missing()),
    ];

    if !event.resources.is_empty() {
        lines.push("Resources:".to_string());
        for resource in &event.resources {
            lines.push(format!("  - {}", resource.describe()));
        }
    }

    if let Some(details) = details {
        lines.push("Details:".to_string());
        push_section(&mut lines, "Request Parameters", details.request_parameters());
        push_section(&mut lines, "Response Elements", details.response_elements());
    }

    lines.push("-".repeat(SEPARATOR_WIDTH));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_section(lines: &mut Vec<String>, title: &str, entries: Option<&Map<String, Value>>) {
    let Some(entries) = entries.filter(|m| !m.is_empty()) else {
        return;
    };
    lines.push(format!("  {title}:"));
    for (key, value) in entries.iter().filter(|(_, v)| !v.is_null()) {
        lines.push(format!("    {key}: {}", display_value(value)));
    }
}

/// One exported event in JSON form.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecord<'a> {
    timestamp: String,
    event_name: &'a str,
    event_source: &'a str,
    user: &'a str,
    resources: &'a [EventResource],
    details: Option<&'a Map<String, Value>>,
}

/// One pretty-printed JSON object followed by a newline. Records are not
/// wrapped in an array; readers must stream object by object.
pub fn render_json(
    event: &AuditEvent,
    details: Option<&EventDetails>,
) -> serde_json::Result<String> {
    let record = ExportRecord {
        timestamp: event.event_time.format(TIMESTAMP_FORMAT).to_string(),
        event_name: event.name_or_missing(),
        event_source: event.source_or_missing(),
        user: event.username_or_missing(),
        resources: &event.resources,
        details: details.map(EventDetails::as_map),
    };

    let mut json = serde_json::to_string_pretty(&record)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn sample_event() -> AuditEvent {
        AuditEvent::new(Utc.with_ymd_and_hms(2024, 11, 20, 9, 5, 7).unwrap())
            .with_name("Decrypt")
            .with_source("kms.amazonaws.com")
            .with_username("admin")
            .with_resource(EventResource::new(
                "arn:aws:kms:us-east-1:111122223333:key/1234abcd",
                "AWS::KMS::Key",
            ))
            .with_raw_detail(
                r#"{
                    "errorCode": "AccessDenied",
                    "requestParameters": {"keyId": "1234abcd", "encryptionContext": null},
                    "responseElements": {"keyState": "Enabled"}
                }"#,
            )
    }

    fn read_json_records(path: &Path) -> Vec<Value> {
        let content = fs::read_to_string(path).unwrap();
        serde_json::Deserializer::from_str(&content)
            .into_iter::<Value>()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_service_directory_on_construction() {
        let tmp = TempDir::new().unwrap();
        FileEventSink::new(tmp.path(), "kms", None, ExportFormat::Text).unwrap();
        assert!(tmp.path().join("kms").is_dir());
    }

    #[test]
    fn creates_empty_daily_file_on_construction() {
        let tmp = TempDir::new().unwrap();
        let sink = FileEventSink::new(tmp.path(), "kms", None, ExportFormat::Text).unwrap();
        let path = sink.current_destination();
        assert!(path.starts_with(tmp.path().join("kms")));
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn creates_empty_custom_file_on_construction() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("x/events.json");
        FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Json).unwrap();
        assert!(file.is_file());
        assert_eq!(fs::read_to_string(&file).unwrap(), "");
    }

    #[test]
    fn construction_keeps_existing_records() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("events.log");
        fs::write(&file, "earlier\n").unwrap();
        FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Text).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "earlier\n");
    }

    #[test]
    fn unopenable_destination_fails_construction() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("taken");
        fs::create_dir(&file).unwrap();
        let err = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Text)
            .err()
            .unwrap();
        assert!(matches!(err, MonitorError::InvalidConfig { .. }));
    }

    #[test]
    fn creates_parent_of_custom_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a/b/events.json");
        let sink = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Json).unwrap();
        assert!(tmp.path().join("a/b").is_dir());
        assert!(!tmp.path().join("kms").exists());
        assert_eq!(sink.current_destination(), file);
    }

    #[test]
    fn daily_path_is_a_function_of_the_date() {
        let tmp = TempDir::new().unwrap();
        let sink = FileEventSink::new(tmp.path(), "s3", None, ExportFormat::Text).unwrap();
        let day1 = NaiveDate::from_ymd_opt(2024, 11, 20).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 11, 21).unwrap();

        assert_eq!(
            sink.path_for_date(day1),
            tmp.path().join("s3/s3-events-2024-11-20.log")
        );
        assert_ne!(sink.path_for_date(day1), sink.path_for_date(day2));
    }

    #[test]
    fn custom_file_ignores_the_date() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("export.log");
        let sink = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Text).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(sink.path_for_date(day), file);
    }

    #[test]
    fn text_block_layout() {
        let event = sample_event();
        let text = render_text(&event, event.details());

        let expected = format!(
            "[2024-11-20 09:05:07] Decrypt\n\
             Source: kms.amazonaws.com\n\
             User: admin\n\
             Resources:\n  \
             - arn:aws:kms:us-east-1:111122223333:key/1234abcd (AWS::KMS::Key)\n\
             Details:\n  \
             Request Parameters:\n    \
             keyId: 1234abcd\n  \
             Response Elements:\n    \
             keyState: Enabled\n\
             {}\n",
            "-".repeat(80)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn text_without_details_or_resources() {
        let event = AuditEvent::new(Utc.with_ymd_and_hms(2024, 11, 20, 9, 5, 7).unwrap());
        let text = render_text(&event, None);
        assert!(text.starts_with("[2024-11-20 09:05:07] N/A\nSource: N/A\nUser: N/A\n"));
        assert!(!text.contains("Resources:"));
        assert!(!text.contains("Details:"));
    }

    #[test]
    fn appends_text_records() {
        let tmp = TempDir::new().unwrap();
        let sink = FileEventSink::new(tmp.path(), "kms", None, ExportFormat::Text).unwrap();
        let event = sample_event();

        sink.write(&event, event.details()).unwrap();
        sink.write(&event, event.details()).unwrap();

        let content = fs::read_to_string(sink.current_destination()).unwrap();
        assert_eq!(content.matches("[2024-11-20 09:05:07] Decrypt").count(), 2);
    }

    #[test]
    fn json_record_round_trips_identity_fields() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("events.json");
        let sink = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Json).unwrap();
        let event = sample_event();

        sink.write(&event, event.details()).unwrap();

        let records = read_json_records(&file);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record["eventName"], "Decrypt");
        assert_eq!(record["user"], "admin");
        assert_eq!(record["timestamp"], "2024-11-20 09:05:07");
        assert_eq!(record["details"]["errorCode"], "AccessDenied");

        let resources: Vec<EventResource> =
            serde_json::from_value(record["resources"].clone()).unwrap();
        assert_eq!(resources, event.resources);
    }

    #[test]
    fn json_file_is_a_sequence_not_an_array() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("events.json");
        let sink = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Json).unwrap();
        let event = sample_event();

        sink.write(&event, event.details()).unwrap();
        sink.write(&event, None).unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with('{'));
        assert!(content.ends_with("}\n"));
        assert!(serde_json::from_str::<Value>(&content).is_err());

        let records = read_json_records(&file);
        assert_eq!(records.len(), 2);
        assert!(records[1]["details"].is_null());
    }

    #[test]
    fn unwritable_destination_is_sink_write_failed() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("events.log");
        let sink = FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Text).unwrap();
        // A directory where the file should be makes the open fail.
        fs::remove_file(&file).unwrap();
        fs::create_dir(&file).unwrap();

        let err = sink.write(&sample_event(), None).unwrap_err();
        match err {
            MonitorError::SinkWriteFailed { path, .. } => assert_eq!(path, file),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn concurrent_text_writers_never_interleave() {
        let tmp = TempDir::new().unwrap();
        let sink = Arc::new(FileEventSink::new(tmp.path(), "kms", None, ExportFormat::Text).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        let event = sample_event().with_username(&format!("worker-{worker}-{i}"));
                        sink.write(&event, event.details()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(sink.current_destination()).unwrap();
        let separator = format!("{}\n", "-".repeat(80));
        let blocks: Vec<&str> = content
            .split(separator.as_str())
            .filter(|b| !b.is_empty())
            .collect();

        assert_eq!(blocks.len(), 400);
        let single = render_text(&sample_event(), sample_event().details());
        let expected_lines = single.lines().count() - 1;
        for block in blocks {
            assert!(block.starts_with("[2024-11-20 09:05:07] Decrypt\n"));
            assert_eq!(block.lines().count(), expected_lines);
            assert_eq!(block.matches("User: worker-").count(), 1);
        }
    }

    #[test]
    fn concurrent_json_writers_produce_parseable_stream() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("events.json");
        let sink =
            Arc::new(FileEventSink::new(tmp.path(), "kms", Some(&file), ExportFormat::Json).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..25 {
                        let event = sample_event().with_username(&format!("w{worker}-{i}"));
                        sink.write(&event, event.details()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = read_json_records(&file);
        assert_eq!(records.len(), 100);
        assert!(records.iter().all(|r| r["eventName"] == "Decrypt"));
    }
}
