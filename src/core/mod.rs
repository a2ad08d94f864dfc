pub mod calculator;
pub mod clock;
pub mod controller;
pub mod location;
pub mod log;

pub use controller::{AttendanceController, SessionState, Stats};
