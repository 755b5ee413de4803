pub mod aws;
pub mod sink;
