//! Derived reports over approved grades: GPA, credit summary, transcript.
//!
//! Pure projections; the math lives in domain::grading. Students are
//! resolved fail-closed like every other workflow entry point.

use crate::domain::{grading, CreditSummary, DomainError, TranscriptRow};
use crate::ports::{GradeStore, StudentStore};
use std::sync::Arc;

pub struct ReportService {
    students: Arc<dyn StudentStore>,
    grades: Arc<dyn GradeStore>,
}

impl ReportService {
    pub fn new(students: Arc<dyn StudentStore>, grades: Arc<dyn GradeStore>) -> Self {
        Self { students, grades }
    }

    /// Credit-weighted GPA over approved grades, rounded to two
    /// decimals. A student with no approved credits gets 0.0.
    pub async fn gpa(&self, student_id: &str) -> Result<f64, DomainError> {
        let rows = self.approved(student_id).await?;
        let pairs: Vec<(f64, f64)> = rows.iter().map(|r| (r.credit, r.score)).collect();
        Ok(grading::weighted_gpa(&pairs))
    }

    /// Approved credits split by course type plus graduation progress.
    pub async fn credit_summary(&self, student_id: &str) -> Result<CreditSummary, DomainError> {
        let rows = self.approved(student_id).await?;
        Ok(grading::summarize_credits(&rows))
    }

    /// The transcript column set, ordered by semester, for the external
    /// report renderer.
    pub async fn transcript(&self, student_id: &str) -> Result<Vec<TranscriptRow>, DomainError> {
        self.approved(student_id).await
    }

    async fn approved(&self, student_id: &str) -> Result<Vec<TranscriptRow>, DomainError> {
        self.students
            .get_student(student_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "student",
                id: student_id.to_owned(),
            })?;
        self.grades.approved_rows(student_id).await
    }
}
