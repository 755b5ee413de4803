pub mod event_sink;
pub mod event_source;
pub mod scan_reporter;
