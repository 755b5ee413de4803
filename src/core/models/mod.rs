pub mod audit_event;
pub mod event_details;
pub mod filter_criteria;
pub mod run_summary;
pub mod service_profile;
pub mod time_window;
