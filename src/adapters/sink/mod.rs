pub mod file_event_sink;
