//! Grade lifecycle: submit (pending) -> approve (audited) -> reopen.
//!
//! Approval is a batch transition over a course; every state change
//! appends to the audit log, which is never truncated. The student's
//! cached credit total is refreshed wherever the approved set changes.

use crate::domain::{grading, DomainError, GradeStatus};
use crate::ports::{CourseStore, EnrollmentStore, GradeStore, StudentStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub struct GradeService {
    students: Arc<dyn StudentStore>,
    courses: Arc<dyn CourseStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    grades: Arc<dyn GradeStore>,
}

impl GradeService {
    pub fn new(
        students: Arc<dyn StudentStore>,
        courses: Arc<dyn CourseStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        grades: Arc<dyn GradeStore>,
    ) -> Self {
        Self {
            students,
            courses,
            enrollments,
            grades,
        }
    }

    /// Record a pending score for a student-course pair. Last submission
    /// wins while the grade is pending; an approved grade must be
    /// reopened before it can be resubmitted.
    pub async fn submit(
        &self,
        student_id: &str,
        course_code: &str,
        score: f64,
    ) -> Result<(), DomainError> {
        if !(0.0..=100.0).contains(&score) {
            return Err(DomainError::Validation(format!(
                "score {score} outside [0, 100]"
            )));
        }
        self.require_student(student_id).await?;
        self.require_course(course_code).await?;
        // A grade only makes sense for a pair that was actually enrolled.
        self.enrollments
            .get_enrollment(student_id, course_code)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "enrollment",
                id: format!("{student_id}/{course_code}"),
            })?;

        if let Some(grade) = self.grades.get_grade(student_id, course_code).await? {
            if grade.status == GradeStatus::Approved {
                return Err(DomainError::GradeLocked {
                    student: student_id.to_owned(),
                    course: course_code.to_owned(),
                });
            }
        }

        self.grades
            .upsert_pending(student_id, course_code, score)
            .await?;
        info!(student = student_id, course = course_code, score, "grade submitted");
        Ok(())
    }

    /// Approve every pending grade under a course in one batch. Each
    /// transition appends one audit entry; affected students get their
    /// cached credit totals refreshed. Returns how many grades moved.
    pub async fn approve(&self, course_code: &str, approver: &str) -> Result<usize, DomainError> {
        let approver = approver.trim();
        if approver.is_empty() {
            return Err(DomainError::Validation("approver must not be blank".into()));
        }
        self.require_course(course_code).await?;

        let affected = self
            .grades
            .approve_pending(course_code, approver, Utc::now())
            .await?;
        for student_id in &affected {
            self.refresh_cached_credits(student_id).await?;
        }
        info!(
            course = course_code,
            approver,
            count = affected.len(),
            "grades approved"
        );
        Ok(affected.len())
    }

    /// Flip an approved grade back to pending so it can be resubmitted.
    /// The audit log stays intact.
    pub async fn reopen(&self, student_id: &str, course_code: &str) -> Result<(), DomainError> {
        let grade = self
            .grades
            .get_grade(student_id, course_code)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "grade",
                id: format!("{student_id}/{course_code}"),
            })?;
        if grade.status == GradeStatus::Pending {
            return Err(DomainError::Validation(format!(
                "grade for '{student_id}'/'{course_code}' is already pending"
            )));
        }

        self.grades.reopen(student_id, course_code).await?;
        self.refresh_cached_credits(student_id).await?;
        info!(student = student_id, course = course_code, "grade reopened");
        Ok(())
    }

    async fn refresh_cached_credits(&self, student_id: &str) -> Result<(), DomainError> {
        let rows = self.grades.approved_rows(student_id).await?;
        let total: f64 = rows.iter().map(|r| r.credit).sum();
        self.students
            .update_cached_credits(student_id, grading::round2(total))
            .await
    }

    async fn require_student(&self, id: &str) -> Result<(), DomainError> {
        self.students
            .get_student(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound {
                entity: "student",
                id: id.to_owned(),
            })
    }

    async fn require_course(&self, code: &str) -> Result<(), DomainError> {
        self.courses
            .get_course(code)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound {
                entity: "course",
                id: code.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::SqliteStore;
    use crate::domain::{Course, CourseType, Enrollment, EnrollmentStatus, Gender, Student};

    struct Fixture {
        store: Arc<SqliteStore>,
        grades: GradeService,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        let grades = GradeService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        Fixture { store, grades }
    }

    impl Fixture {
        async fn seed_pair(&self, student_id: &str, course_code: &str, credit: f64) {
            if self.store.get_student(student_id).await.unwrap().is_none() {
                self.store
                    .add_student(&Student {
                        id: student_id.to_owned(),
                        name: "李四".into(),
                        gender: Gender::Female,
                        class_label: "CS-2023".into(),
                        enrolled_on: "2023-09-01".into(),
                        credits_earned: 0.0,
                    })
                    .await
                    .unwrap();
            }
            if self.store.get_course(course_code).await.unwrap().is_none() {
                self.store
                    .add_course(&Course {
                        code: course_code.to_owned(),
                        name: format!("{course_code} name"),
                        credit,
                        kind: CourseType::Required,
                        semester: "2023-2".into(),
                        prerequisites: vec![],
                        time_slot: None,
                    })
                    .await
                    .unwrap();
            }
            self.store
                .insert_enrollment(&Enrollment {
                    student_id: student_id.to_owned(),
                    course_code: course_code.to_owned(),
                    status: EnrollmentStatus::Active,
                    enrolled_at: Utc::now(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_range_score_without_writing() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;

        for bad in [101.0, -1.0] {
            let err = f.grades.submit("S1", "CS101", bad).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{err}");
        }
        assert!(f.store.get_grade("S1", "CS101").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_requires_enrollment() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;
        // CS102 exists but S1 never enrolled in it.
        f.store
            .add_course(&Course {
                code: "CS102".into(),
                name: "CS102 name".into(),
                credit: 2.0,
                kind: CourseType::Elective,
                semester: "2023-2".into(),
                prerequisites: vec![],
                time_slot: None,
            })
            .await
            .unwrap();

        let err = f.grades.submit("S1", "CS102", 80.0).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "enrollment", .. }));
    }

    #[tokio::test]
    async fn test_submit_over_approved_is_locked_until_reopened() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;
        f.grades.submit("S1", "CS101", 92.0).await.unwrap();
        f.grades.approve("CS101", "王老师").await.unwrap();

        let err = f.grades.submit("S1", "CS101", 95.0).await.unwrap_err();
        assert!(matches!(err, DomainError::GradeLocked { .. }));

        f.grades.reopen("S1", "CS101").await.unwrap();
        f.grades.submit("S1", "CS101", 95.0).await.unwrap();

        let grade = f.store.get_grade("S1", "CS101").await.unwrap().unwrap();
        assert_eq!(grade.score, 95.0);
        assert_eq!(grade.status, GradeStatus::Pending);
        // Reopen and resubmit never touch the audit history.
        assert_eq!(grade.audit.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_is_batch_and_refreshes_cached_credits() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;
        f.seed_pair("S2", "CS101", 4.0).await;
        f.grades.submit("S1", "CS101", 92.0).await.unwrap();
        f.grades.submit("S2", "CS101", 75.0).await.unwrap();

        let count = f.grades.approve("CS101", "王老师").await.unwrap();
        assert_eq!(count, 2);
        for id in ["S1", "S2"] {
            let student = f.store.get_student(id).await.unwrap().unwrap();
            assert_eq!(student.credits_earned, 4.0);
        }

        // Nothing left to approve.
        assert_eq!(f.grades.approve("CS101", "王老师").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approve_rejects_blank_approver_and_unknown_course() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;

        let err = f.grades.approve("CS101", "  ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = f.grades.approve("NOPE", "王老师").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "course", .. }));
    }

    #[tokio::test]
    async fn test_reopen_pending_grade_is_an_error() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;
        f.grades.submit("S1", "CS101", 92.0).await.unwrap();

        let err = f.grades.reopen("S1", "CS101").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = f.grades.reopen("S1", "NOPE").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "grade", .. }));
    }

    #[tokio::test]
    async fn test_reopen_shrinks_cached_credits() {
        let f = fixture().await;
        f.seed_pair("S1", "CS101", 4.0).await;
        f.grades.submit("S1", "CS101", 92.0).await.unwrap();
        f.grades.approve("CS101", "王老师").await.unwrap();
        assert_eq!(
            f.store.get_student("S1").await.unwrap().unwrap().credits_earned,
            4.0
        );

        f.grades.reopen("S1", "CS101").await.unwrap();
        assert_eq!(
            f.store.get_student("S1").await.unwrap().unwrap().credits_earned,
            0.0
        );
    }
}
