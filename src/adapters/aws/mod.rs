pub mod cloudtrail_source;
pub mod profiles;
pub mod session;
