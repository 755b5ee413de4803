pub mod filter;
pub mod monitor_service;
pub mod page_consumer;
pub mod time_range;
