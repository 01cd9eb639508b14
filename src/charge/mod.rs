//! Charge cycle and its log file

mod job;
mod journal;

pub use job::ChargeJob;
pub use journal::ChargeLog;
