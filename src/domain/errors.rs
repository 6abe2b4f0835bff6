//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Caller input rejected before any write (bad score, blank approver,
    /// malformed time slot). Not retryable without correcting the input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referential gap: the named entity does not exist. Raised at the
    /// workflow boundary, never silently treated as "no constraint".
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Integrity conflict on the (student, course) enrollment key. One
    /// row per pair ever; a prior attempt counts regardless of status.
    #[error("student '{student}' already enrolled in or previously attempted '{course}'")]
    AlreadyEnrolled { student: String, course: String },

    /// Eligibility failure: target course meets at the same time as an
    /// active enrollment.
    #[error("schedule conflict with '{course}'")]
    ScheduleConflict { course: String },

    /// Eligibility failure: required courses not yet completed.
    #[error("prerequisite not met: missing {}", .missing.join(", "))]
    PrerequisiteNotMet { missing: Vec<String> },

    /// Submitting over an approved grade. Requires an explicit reopen.
    #[error("grade for '{student}'/'{course}' is already approved; reopen it first")]
    GradeLocked { student: String, course: String },

    #[error("store error: {0}")]
    Store(String),
}
