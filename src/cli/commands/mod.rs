pub mod profiles;
pub mod scan;
