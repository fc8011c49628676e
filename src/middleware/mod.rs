pub mod error_detail;
pub mod payload;
pub mod session;
pub mod throttle;
