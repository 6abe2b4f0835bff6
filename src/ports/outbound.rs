//! Outbound ports. Application calls into the record store.
//!
//! Implemented by adapters. One store may implement several ports.

use crate::domain::{
    Course, DomainError, Enrollment, EnrollmentStatus, Grade, Student, TimeSlot, TranscriptRow,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Course catalogue access.
#[async_trait::async_trait]
pub trait CourseStore: Send + Sync {
    /// Insert a new course. The code must be unused.
    async fn add_course(&self, course: &Course) -> Result<(), DomainError>;

    async fn get_course(&self, code: &str) -> Result<Option<Course>, DomainError>;
}

/// Student roster access.
#[async_trait::async_trait]
pub trait StudentStore: Send + Sync {
    /// Insert a new student. The id must be unused.
    async fn add_student(&self, student: &Student) -> Result<(), DomainError>;

    async fn get_student(&self, id: &str) -> Result<Option<Student>, DomainError>;

    /// Overwrite the cached approved-credit total for a student.
    async fn update_cached_credits(&self, student_id: &str, credits: f64)
        -> Result<(), DomainError>;
}

/// Enrollment rows and the reads the eligibility checks need.
#[async_trait::async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn get_enrollment(
        &self,
        student_id: &str,
        course_code: &str,
    ) -> Result<Option<Enrollment>, DomainError>;

    /// Insert a new enrollment row. The composite (student, course) key
    /// is unique; a second insert for the same pair fails with
    /// `AlreadyEnrolled` rather than overwriting.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError>;

    async fn set_status(
        &self,
        student_id: &str,
        course_code: &str,
        status: EnrollmentStatus,
    ) -> Result<(), DomainError>;

    /// Time slots of the student's active enrollments, keyed by course
    /// code. Courses without a recorded slot are omitted.
    async fn active_slots(
        &self,
        student_id: &str,
    ) -> Result<Vec<(String, TimeSlot)>, DomainError>;

    /// Which of the given (distinct) course codes the student has
    /// completed. Queried with a fixed-size placeholder list, one per
    /// code — never string-formatted identifiers.
    async fn completed_among(
        &self,
        student_id: &str,
        codes: &[String],
    ) -> Result<HashSet<String>, DomainError>;
}

/// Grade rows plus their append-only audit log.
#[async_trait::async_trait]
pub trait GradeStore: Send + Sync {
    /// Fetch a grade with its audit log (oldest entry first).
    async fn get_grade(
        &self,
        student_id: &str,
        course_code: &str,
    ) -> Result<Option<Grade>, DomainError>;

    /// Create or replace the pair's grade as pending. Last submission
    /// wins; the workflow guards against overwriting an approved grade.
    async fn upsert_pending(
        &self,
        student_id: &str,
        course_code: &str,
        score: f64,
    ) -> Result<(), DomainError>;

    /// Transition every pending grade under the course to approved and
    /// append one audit entry per grade, in a single transaction.
    /// Returns the affected student ids.
    async fn approve_pending(
        &self,
        course_code: &str,
        approver: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<String>, DomainError>;

    /// Flip an approved grade back to pending. The audit log is kept.
    async fn reopen(&self, student_id: &str, course_code: &str) -> Result<(), DomainError>;

    /// Approved grades joined with course data, ordered by semester.
    async fn approved_rows(&self, student_id: &str) -> Result<Vec<TranscriptRow>, DomainError>;
}
