//! Attendance session core: registry, lifecycle, recorder and statistics.

pub mod attendance_record;
pub mod attendance_stats;
pub mod context;
pub mod error;
pub mod scope;
pub mod session_lifecycle;
pub mod session_registry;

#[cfg(test)]
mod testing;

pub use context::{Actor, RequestContext};
pub use error::{AttendanceError, AttendanceResult};
