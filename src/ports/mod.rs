//! Port traits. API boundaries for the hexagon.
//!
//! Outbound: called by the application into the record store.

pub mod outbound;

pub use outbound::{CourseStore, EnrollmentStore, GradeStore, StudentStore};
