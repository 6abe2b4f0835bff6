//! Enrollment admission and lifecycle transitions.
//!
//! - Resolves student and course up front (fail-closed, NotFound)
//! - Conflict check before prerequisite check; first failure wins
//! - On success exactly one new active row exists; nothing is written
//!   on any failure path

use crate::domain::{eligibility, DomainError, Enrollment, EnrollmentStatus};
use crate::ports::{CourseStore, EnrollmentStore, StudentStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Enrollment workflow. Combines the eligibility checks with the
/// enrollment-record writes.
pub struct EnrollmentService {
    students: Arc<dyn StudentStore>,
    courses: Arc<dyn CourseStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl EnrollmentService {
    pub fn new(
        students: Arc<dyn StudentStore>,
        courses: Arc<dyn CourseStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            students,
            courses,
            enrollments,
        }
    }

    /// Admit a student into a course.
    pub async fn enroll(
        &self,
        student_id: &str,
        course_code: &str,
    ) -> Result<Enrollment, DomainError> {
        let student = self
            .students
            .get_student(student_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "student",
                id: student_id.to_owned(),
            })?;
        let course = self
            .courses
            .get_course(course_code)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "course",
                id: course_code.to_owned(),
            })?;

        // One row per pair ever, regardless of prior status. Not retryable.
        if self
            .enrollments
            .get_enrollment(student_id, course_code)
            .await?
            .is_some()
        {
            return Err(DomainError::AlreadyEnrolled {
                student: student.id,
                course: course.code,
            });
        }

        let active = self.enrollments.active_slots(student_id).await?;
        if let Some(code) = eligibility::find_schedule_conflict(&active, course.time_slot.as_ref())
        {
            return Err(DomainError::ScheduleConflict {
                course: code.to_owned(),
            });
        }

        let required = eligibility::distinct_codes(&course.prerequisites);
        if !required.is_empty() {
            let completed = self
                .enrollments
                .completed_among(student_id, &required)
                .await?;
            let missing = eligibility::missing_prerequisites(&course.prerequisites, &completed);
            if !missing.is_empty() {
                return Err(DomainError::PrerequisiteNotMet { missing });
            }
        }

        let enrollment = Enrollment {
            student_id: student.id,
            course_code: course.code,
            status: EnrollmentStatus::Active,
            enrolled_at: Utc::now(),
        };
        // Single writer: nothing can insert between the pre-check and
        // here, and the composite key backstops the invariant anyway.
        // Multi-user deployments would need a transaction around both.
        self.enrollments.insert_enrollment(&enrollment).await?;
        info!(
            student = %enrollment.student_id,
            course = %enrollment.course_code,
            "enrollment created"
        );
        Ok(enrollment)
    }

    /// Mark an existing enrollment withdrawn.
    pub async fn withdraw(&self, student_id: &str, course_code: &str) -> Result<(), DomainError> {
        self.transition(student_id, course_code, EnrollmentStatus::Withdrawn)
            .await
    }

    /// Mark an existing enrollment completed, making it count toward
    /// prerequisites.
    pub async fn complete(&self, student_id: &str, course_code: &str) -> Result<(), DomainError> {
        self.transition(student_id, course_code, EnrollmentStatus::Completed)
            .await
    }

    async fn transition(
        &self,
        student_id: &str,
        course_code: &str,
        status: EnrollmentStatus,
    ) -> Result<(), DomainError> {
        self.enrollments
            .get_enrollment(student_id, course_code)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "enrollment",
                id: format!("{student_id}/{course_code}"),
            })?;
        self.enrollments
            .set_status(student_id, course_code, status)
            .await?;
        info!(
            student = student_id,
            course = course_code,
            status = status.as_str(),
            "enrollment status changed"
        );
        Ok(())
    }
}
