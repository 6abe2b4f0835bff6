//! SQLite-backed record store via libsql. Implements all four store ports.
//!
//! Five tables: students, courses, enrollments, grades, grade_audit.
//! Composite (student_id, course_code) primary keys on enrollments and
//! grades back the one-row-per-pair invariants; every statement is
//! parameterized. One database file: records.db in the data directory.

use crate::domain::{
    AuditEntry, Course, CourseType, DomainError, Enrollment, EnrollmentStatus, Gender, Grade,
    GradeStatus, Student, TimeSlot, TranscriptRow,
};
use crate::ports::{CourseStore, EnrollmentStore, GradeStore, StudentStore};
use chrono::{DateTime, Utc};
use libsql::{params, Connection, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

const STUDENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    gender TEXT NOT NULL,
    class_label TEXT NOT NULL,
    enrolled_on TEXT NOT NULL,
    credits_earned REAL NOT NULL DEFAULT 0
)"#;

const COURSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    credit REAL NOT NULL,
    kind TEXT NOT NULL,
    semester TEXT NOT NULL,
    prerequisites TEXT NOT NULL DEFAULT '',
    time_slot TEXT
)"#;

const ENROLLMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS enrollments (
    student_id TEXT NOT NULL,
    course_code TEXT NOT NULL,
    status TEXT NOT NULL,
    enrolled_at TEXT NOT NULL,
    PRIMARY KEY (student_id, course_code)
)"#;

const GRADES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS grades (
    student_id TEXT NOT NULL,
    course_code TEXT NOT NULL,
    score REAL NOT NULL,
    status TEXT NOT NULL,
    PRIMARY KEY (student_id, course_code)
)"#;

/// Append-only approval log. Rows are only ever inserted.
const GRADE_AUDIT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS grade_audit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id TEXT NOT NULL,
    course_code TEXT NOT NULL,
    approver TEXT NOT NULL,
    approved_at TEXT NOT NULL
)"#;

const GRADE_AUDIT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_grade_audit_pair ON grade_audit (student_id, course_code)";

/// SQLite record store. Holds a single connection; the core assumes a
/// single writer, so no pooling.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Connect to (or create) records.db under the data directory and
    /// ensure the schema exists. Call once at startup; share via Arc.
    ///
    /// WAL mode and synchronous=NORMAL for durability without paying
    /// for a full fsync per statement.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Store(e.to_string()))?;
        let db_path = base.join("records.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Store(e.to_string()))?;

        // PRAGMA returns a row (the new value); consume via query since
        // execute fails when rows come back.
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Store(format!("{pragma} failed: {e}")))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?
                .is_some()
            {}
        }

        Self::init_schema(&conn).await?;
        info!(path = %db_path.display(), "SQLite record store connected");
        Ok(Self { conn })
    }

    /// In-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, DomainError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Store(e.to_string()))?;
        Self::init_schema(&conn).await?;
        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<(), DomainError> {
        for ddl in [
            STUDENTS_TABLE,
            COURSES_TABLE,
            ENROLLMENTS_TABLE,
            GRADES_TABLE,
            GRADE_AUDIT_TABLE,
            GRADE_AUDIT_INDEX,
        ] {
            conn.execute(ddl, ())
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?;
        }
        Ok(())
    }

    fn is_unique_violation(err: &libsql::Error) -> bool {
        err.to_string().contains("UNIQUE constraint failed")
    }

    fn join_prereqs(codes: &[String]) -> String {
        codes.join(",")
    }

    fn split_prereqs(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// A stored slot that no longer parses means a corrupted row, not a
    /// missing constraint.
    fn parse_slot(raw: Option<String>) -> Result<Option<TimeSlot>, DomainError> {
        raw.map(|s| {
            s.parse::<TimeSlot>()
                .map_err(|e| DomainError::Store(format!("stored time slot invalid: {e}")))
        })
        .transpose()
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DomainError::Store(format!("stored timestamp invalid: {e}")))
    }
}

#[async_trait::async_trait]
impl CourseStore for SqliteStore {
    async fn add_course(&self, course: &Course) -> Result<(), DomainError> {
        let slot = course.time_slot.as_ref().map(TimeSlot::to_string);
        self.conn
            .execute(
                r#"
                INSERT INTO courses (code, name, credit, kind, semester, prerequisites, time_slot)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    course.code.as_str(),
                    course.name.as_str(),
                    course.credit,
                    course.kind.as_str(),
                    course.semester.as_str(),
                    Self::join_prereqs(&course.prerequisites),
                    slot
                ],
            )
            .await
            .map_err(|e| {
                if Self::is_unique_violation(&e) {
                    DomainError::Validation(format!("course '{}' already exists", course.code))
                } else {
                    DomainError::Store(e.to_string())
                }
            })?;
        Ok(())
    }

    async fn get_course(&self, code: &str) -> Result<Option<Course>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT code, name, credit, kind, semester, prerequisites, time_slot
                FROM courses
                WHERE code = ?1
                "#,
                params![code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let code: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let name: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
        let credit: f64 = row.get(2).map_err(|e| DomainError::Store(e.to_string()))?;
        let kind: String = row.get(3).map_err(|e| DomainError::Store(e.to_string()))?;
        let semester: String = row.get(4).map_err(|e| DomainError::Store(e.to_string()))?;
        let prereqs: String = row.get::<String>(5).unwrap_or_default();
        let slot: Option<String> = row.get::<String>(6).ok();
        Ok(Some(Course {
            code,
            name,
            credit,
            kind: kind
                .parse::<CourseType>()
                .map_err(|e| DomainError::Store(e.to_string()))?,
            semester,
            prerequisites: Self::split_prereqs(&prereqs),
            time_slot: Self::parse_slot(slot)?,
        }))
    }
}

#[async_trait::async_trait]
impl StudentStore for SqliteStore {
    async fn add_student(&self, student: &Student) -> Result<(), DomainError> {
        self.conn
            .execute(
                r#"
                INSERT INTO students (id, name, gender, class_label, enrolled_on, credits_earned)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    student.id.as_str(),
                    student.name.as_str(),
                    student.gender.as_str(),
                    student.class_label.as_str(),
                    student.enrolled_on.as_str(),
                    student.credits_earned
                ],
            )
            .await
            .map_err(|e| {
                if Self::is_unique_violation(&e) {
                    DomainError::Validation(format!("student '{}' already exists", student.id))
                } else {
                    DomainError::Store(e.to_string())
                }
            })?;
        Ok(())
    }

    async fn get_student(&self, id: &str) -> Result<Option<Student>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT id, name, gender, class_label, enrolled_on, credits_earned
                FROM students
                WHERE id = ?1
                "#,
                params![id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let name: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
        let gender: String = row.get(2).map_err(|e| DomainError::Store(e.to_string()))?;
        let class_label: String = row.get(3).map_err(|e| DomainError::Store(e.to_string()))?;
        let enrolled_on: String = row.get(4).map_err(|e| DomainError::Store(e.to_string()))?;
        let credits_earned: f64 = row.get(5).map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(Some(Student {
            id,
            name,
            gender: gender
                .parse::<Gender>()
                .map_err(|e| DomainError::Store(e.to_string()))?,
            class_label,
            enrolled_on,
            credits_earned,
        }))
    }

    async fn update_cached_credits(
        &self,
        student_id: &str,
        credits: f64,
    ) -> Result<(), DomainError> {
        self.conn
            .execute(
                "UPDATE students SET credits_earned = ?2 WHERE id = ?1",
                params![student_id, credits],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl EnrollmentStore for SqliteStore {
    async fn get_enrollment(
        &self,
        student_id: &str,
        course_code: &str,
    ) -> Result<Option<Enrollment>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT student_id, course_code, status, enrolled_at
                FROM enrollments
                WHERE student_id = ?1 AND course_code = ?2
                "#,
                params![student_id, course_code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let student_id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let course_code: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
        let status: String = row.get(2).map_err(|e| DomainError::Store(e.to_string()))?;
        let enrolled_at: String = row.get(3).map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(Some(Enrollment {
            student_id,
            course_code,
            status: status.parse::<EnrollmentStatus>()?,
            enrolled_at: Self::parse_timestamp(&enrolled_at)?,
        }))
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
        self.conn
            .execute(
                r#"
                INSERT INTO enrollments (student_id, course_code, status, enrolled_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    enrollment.student_id.as_str(),
                    enrollment.course_code.as_str(),
                    enrollment.status.as_str(),
                    enrollment.enrolled_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| {
                if Self::is_unique_violation(&e) {
                    DomainError::AlreadyEnrolled {
                        student: enrollment.student_id.clone(),
                        course: enrollment.course_code.clone(),
                    }
                } else {
                    DomainError::Store(e.to_string())
                }
            })?;
        Ok(())
    }

    async fn set_status(
        &self,
        student_id: &str,
        course_code: &str,
        status: EnrollmentStatus,
    ) -> Result<(), DomainError> {
        self.conn
            .execute(
                "UPDATE enrollments SET status = ?3 WHERE student_id = ?1 AND course_code = ?2",
                params![student_id, course_code, status.as_str()],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn active_slots(
        &self,
        student_id: &str,
    ) -> Result<Vec<(String, TimeSlot)>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT e.course_code, c.time_slot
                FROM enrollments e
                JOIN courses c ON c.code = e.course_code
                WHERE e.student_id = ?1 AND e.status = 'active' AND c.time_slot IS NOT NULL
                "#,
                params![student_id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut slots = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let code: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            let raw: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
            let slot = raw
                .parse::<TimeSlot>()
                .map_err(|e| DomainError::Store(format!("stored time slot invalid: {e}")))?;
            slots.push((code, slot));
        }
        Ok(slots)
    }

    async fn completed_among(
        &self,
        student_id: &str,
        codes: &[String],
    ) -> Result<HashSet<String>, DomainError> {
        if codes.is_empty() {
            return Ok(HashSet::new());
        }
        // Placeholder list sized from the distinct code set; the codes
        // travel as bound values, never as spliced identifiers.
        let placeholders: Vec<String> = (2..codes.len() + 2).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT course_code FROM enrollments \
             WHERE student_id = ?1 AND status = 'completed' AND course_code IN ({})",
            placeholders.join(", ")
        );
        let mut values: Vec<Value> = Vec::with_capacity(codes.len() + 1);
        values.push(Value::Text(student_id.to_owned()));
        values.extend(codes.iter().map(|c| Value::Text(c.clone())));
        let mut rows = self
            .conn
            .query(&sql, values)
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut completed = HashSet::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let code: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            completed.insert(code);
        }
        Ok(completed)
    }
}

#[async_trait::async_trait]
impl GradeStore for SqliteStore {
    async fn get_grade(
        &self,
        student_id: &str,
        course_code: &str,
    ) -> Result<Option<Grade>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT score, status
                FROM grades
                WHERE student_id = ?1 AND course_code = ?2
                "#,
                params![student_id, course_code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let score: f64 = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
        let status: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;

        let mut audit = Vec::new();
        let mut audit_rows = self
            .conn
            .query(
                r#"
                SELECT approver, approved_at
                FROM grade_audit
                WHERE student_id = ?1 AND course_code = ?2
                ORDER BY id
                "#,
                params![student_id, course_code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        while let Some(row) = audit_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let approver: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            let approved_at: String = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
            audit.push(AuditEntry {
                approver,
                approved_at: Self::parse_timestamp(&approved_at)?,
            });
        }

        Ok(Some(Grade {
            student_id: student_id.to_owned(),
            course_code: course_code.to_owned(),
            score,
            status: status.parse::<GradeStatus>()?,
            audit,
        }))
    }

    async fn upsert_pending(
        &self,
        student_id: &str,
        course_code: &str,
        score: f64,
    ) -> Result<(), DomainError> {
        self.conn
            .execute(
                r#"
                INSERT INTO grades (student_id, course_code, score, status)
                VALUES (?1, ?2, ?3, 'pending')
                ON CONFLICT (student_id, course_code) DO UPDATE SET
                    score = excluded.score,
                    status = 'pending'
                "#,
                params![student_id, course_code, score],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn approve_pending(
        &self,
        course_code: &str,
        approver: &str,
        at: DateTime<Utc>,
    ) -> Result<Vec<String>, DomainError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        let mut students = Vec::new();
        let mut rows = tx
            .query(
                "SELECT student_id FROM grades WHERE course_code = ?1 AND status = 'pending' \
                 ORDER BY student_id",
                params![course_code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let id: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            students.push(id);
        }

        let at_str = at.to_rfc3339();
        for student_id in &students {
            tx.execute(
                r#"
                INSERT INTO grade_audit (student_id, course_code, approver, approved_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    student_id.as_str(),
                    course_code,
                    approver,
                    at_str.as_str()
                ],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        }
        tx.execute(
            "UPDATE grades SET status = 'approved' WHERE course_code = ?1 AND status = 'pending'",
            params![course_code],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(students)
    }

    async fn reopen(&self, student_id: &str, course_code: &str) -> Result<(), DomainError> {
        self.conn
            .execute(
                "UPDATE grades SET status = 'pending' \
                 WHERE student_id = ?1 AND course_code = ?2",
                params![student_id, course_code],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn approved_rows(&self, student_id: &str) -> Result<Vec<TranscriptRow>, DomainError> {
        let mut rows = self
            .conn
            .query(
                r#"
                SELECT c.name, c.credit, g.score, c.kind, c.semester
                FROM grades g
                JOIN courses c ON c.code = g.course_code
                WHERE g.student_id = ?1 AND g.status = 'approved'
                ORDER BY c.semester, c.code
                "#,
                params![student_id],
            )
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut transcript = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let course_name: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            let credit: f64 = row.get(1).map_err(|e| DomainError::Store(e.to_string()))?;
            let score: f64 = row.get(2).map_err(|e| DomainError::Store(e.to_string()))?;
            let kind: String = row.get(3).map_err(|e| DomainError::Store(e.to_string()))?;
            let semester: String = row.get(4).map_err(|e| DomainError::Store(e.to_string()))?;
            transcript.push(TranscriptRow {
                course_name,
                credit,
                score,
                kind: kind
                    .parse::<CourseType>()
                    .map_err(|e| DomainError::Store(e.to_string()))?,
                semester,
            });
        }
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::open_in_memory().await.unwrap()
    }

    fn course(code: &str, semester: &str) -> Course {
        Course {
            code: code.to_owned(),
            name: format!("{code} name"),
            credit: 4.0,
            kind: CourseType::Required,
            semester: semester.to_owned(),
            prerequisites: vec![],
            time_slot: None,
        }
    }

    fn enrollment(student: &str, course: &str, status: EnrollmentStatus) -> Enrollment {
        Enrollment {
            student_id: student.to_owned(),
            course_code: course.to_owned(),
            status,
            enrolled_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_course_roundtrip_with_prereqs_and_slot() {
        let store = store().await;
        let mut c = course("CS201", "2023-2");
        c.prerequisites = vec!["CS101".into(), "MA101".into()];
        c.time_slot = Some("周二-3,4".parse().unwrap());
        store.add_course(&c).await.unwrap();

        let got = store.get_course("CS201").await.unwrap().unwrap();
        assert_eq!(got.prerequisites, vec!["CS101", "MA101"]);
        assert_eq!(got.time_slot.unwrap().to_string(), "周二-3,4");
        assert!(store.get_course("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_enrollment_is_typed_conflict() {
        let store = store().await;
        store.add_course(&course("CS101", "2023-1")).await.unwrap();
        let e = enrollment("S1", "CS101", EnrollmentStatus::Active);
        store.insert_enrollment(&e).await.unwrap();

        let err = store.insert_enrollment(&e).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyEnrolled { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_active_slots_skips_inactive_and_slotless() {
        let store = store().await;
        let mut with_slot = course("CS101", "2023-1");
        with_slot.time_slot = Some("周一-1,2".parse().unwrap());
        store.add_course(&with_slot).await.unwrap();
        store.add_course(&course("MA101", "2023-1")).await.unwrap();
        let mut withdrawn = course("PH101", "2023-1");
        withdrawn.time_slot = Some("周三-5".parse().unwrap());
        store.add_course(&withdrawn).await.unwrap();

        store
            .insert_enrollment(&enrollment("S1", "CS101", EnrollmentStatus::Active))
            .await
            .unwrap();
        store
            .insert_enrollment(&enrollment("S1", "MA101", EnrollmentStatus::Active))
            .await
            .unwrap();
        store
            .insert_enrollment(&enrollment("S1", "PH101", EnrollmentStatus::Withdrawn))
            .await
            .unwrap();

        let slots = store.active_slots("S1").await.unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].0, "CS101");
    }

    #[tokio::test]
    async fn test_completed_among_matches_only_completed() {
        let store = store().await;
        store
            .insert_enrollment(&enrollment("S1", "CS101", EnrollmentStatus::Completed))
            .await
            .unwrap();
        store
            .insert_enrollment(&enrollment("S1", "MA101", EnrollmentStatus::Active))
            .await
            .unwrap();

        let completed = store
            .completed_among("S1", &["CS101".into(), "MA101".into(), "PH101".into()])
            .await
            .unwrap();
        assert_eq!(completed, HashSet::from(["CS101".to_string()]));
        assert!(store.completed_among("S1", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_pending_is_last_submission_wins() {
        let store = store().await;
        store.upsert_pending("S1", "CS101", 70.0).await.unwrap();
        store.upsert_pending("S1", "CS101", 85.0).await.unwrap();

        let grade = store.get_grade("S1", "CS101").await.unwrap().unwrap();
        assert_eq!(grade.score, 85.0);
        assert_eq!(grade.status, GradeStatus::Pending);
        assert!(grade.audit.is_empty());
    }

    #[tokio::test]
    async fn test_approve_pending_is_batch_and_appends_audit() {
        let store = store().await;
        store.upsert_pending("S1", "CS101", 92.0).await.unwrap();
        store.upsert_pending("S2", "CS101", 75.0).await.unwrap();
        store.upsert_pending("S3", "MA101", 60.0).await.unwrap();

        let at = Utc::now();
        let affected = store.approve_pending("CS101", "王老师", at).await.unwrap();
        assert_eq!(affected, vec!["S1".to_string(), "S2".to_string()]);

        let grade = store.get_grade("S1", "CS101").await.unwrap().unwrap();
        assert_eq!(grade.status, GradeStatus::Approved);
        assert_eq!(grade.audit.len(), 1);
        assert_eq!(grade.audit[0].approver, "王老师");

        // Other course untouched; nothing pending left under CS101.
        let other = store.get_grade("S3", "MA101").await.unwrap().unwrap();
        assert_eq!(other.status, GradeStatus::Pending);
        let again = store.approve_pending("CS101", "王老师", at).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_reopen_keeps_audit_log() {
        let store = store().await;
        store.upsert_pending("S1", "CS101", 92.0).await.unwrap();
        store
            .approve_pending("CS101", "王老师", Utc::now())
            .await
            .unwrap();
        store.reopen("S1", "CS101").await.unwrap();

        let grade = store.get_grade("S1", "CS101").await.unwrap().unwrap();
        assert_eq!(grade.status, GradeStatus::Pending);
        assert_eq!(grade.audit.len(), 1);
    }

    #[tokio::test]
    async fn test_approved_rows_ordered_by_semester() {
        let store = store().await;
        let mut later = course("CS301", "2024-1");
        later.kind = CourseType::Elective;
        store.add_course(&later).await.unwrap();
        store.add_course(&course("CS101", "2023-1")).await.unwrap();

        store.upsert_pending("S1", "CS301", 88.0).await.unwrap();
        store.upsert_pending("S1", "CS101", 92.0).await.unwrap();
        store
            .approve_pending("CS301", "王老师", Utc::now())
            .await
            .unwrap();
        store
            .approve_pending("CS101", "王老师", Utc::now())
            .await
            .unwrap();

        let rows = store.approved_rows("S1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].semester, "2023-1");
        assert_eq!(rows[1].semester, "2024-1");
        assert_eq!(rows[1].kind, CourseType::Elective);
    }
}
