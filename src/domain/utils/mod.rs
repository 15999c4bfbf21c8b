pub mod id;
pub mod log_throttle;
