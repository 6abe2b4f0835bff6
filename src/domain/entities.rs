//! Domain entities. Pure data structures for the core business.
//!
//! No SQL/IO types here — these are mapped from adapters.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A registered student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub class_label: String,
    /// Admission date label, e.g. "2023-09-01".
    pub enrolled_on: String,
    /// Cached sum of approved-course credits. Refreshed by the grade workflow.
    pub credits_earned: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(DomainError::Validation(format!("unknown gender '{other}'"))),
        }
    }
}

/// A course in the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub credit: f64,
    #[serde(rename = "type")]
    pub kind: CourseType,
    pub semester: String,
    /// Prerequisite course codes. Duplicates and blank tokens carry no meaning.
    pub prerequisites: Vec<String>,
    pub time_slot: Option<TimeSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseType {
    Required,
    Elective,
}

impl CourseType {
    pub fn as_str(self) -> &'static str {
        match self {
            CourseType::Required => "required",
            CourseType::Elective => "elective",
        }
    }
}

impl FromStr for CourseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "required" => Ok(CourseType::Required),
            "elective" => Ok(CourseType::Elective),
            other => Err(DomainError::Validation(format!(
                "unknown course type '{other}'"
            ))),
        }
    }
}

/// When a course meets: a weekday token plus the period numbers it occupies.
///
/// Text form is `<weekday>-<comma-separated periods>`, e.g. `周二-3,4`.
/// The weekday is opaque and compared by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub weekday: String,
    pub periods: BTreeSet<u8>,
}

impl TimeSlot {
    /// Two slots collide iff they share the weekday and any period number.
    pub fn conflicts_with(&self, other: &TimeSlot) -> bool {
        self.weekday == other.weekday && !self.periods.is_disjoint(&other.periods)
    }
}

impl FromStr for TimeSlot {
    type Err = DomainError;

    /// Blank period tokens are discarded; a slot needs a weekday and at
    /// least one positive period to be meaningful.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::Validation(format!("malformed time slot '{s}'"));
        let (weekday, periods_part) = s.split_once('-').ok_or_else(malformed)?;
        let weekday = weekday.trim();
        if weekday.is_empty() {
            return Err(malformed());
        }
        let mut periods = BTreeSet::new();
        for token in periods_part.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let period: u8 = token.parse().map_err(|_| malformed())?;
            if period == 0 {
                return Err(malformed());
            }
            periods.insert(period);
        }
        if periods.is_empty() {
            return Err(malformed());
        }
        Ok(TimeSlot {
            weekday: weekday.to_owned(),
            periods,
        })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let periods: Vec<String> = self.periods.iter().map(u8::to_string).collect();
        write!(f, "{}-{}", self.weekday, periods.join(","))
    }
}

/// One student-course enrollment. At most one row per pair ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String,
    pub course_code: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Withdrawn,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Withdrawn => "withdrawn",
            EnrollmentStatus::Completed => "completed",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EnrollmentStatus::Active),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            "completed" => Ok(EnrollmentStatus::Completed),
            other => Err(DomainError::Store(format!(
                "unknown enrollment status '{other}'"
            ))),
        }
    }
}

/// A grade for one student-course pair, with its approval history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub student_id: String,
    pub course_code: String,
    pub score: f64,
    pub status: GradeStatus,
    /// Approval events in order of occurrence. The log only ever grows.
    pub audit: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeStatus {
    Pending,
    Approved,
}

impl GradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GradeStatus::Pending => "pending",
            GradeStatus::Approved => "approved",
        }
    }
}

impl FromStr for GradeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GradeStatus::Pending),
            "approved" => Ok(GradeStatus::Approved),
            other => Err(DomainError::Store(format!("unknown grade status '{other}'"))),
        }
    }
}

/// One approval event on a grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub approver: String,
    pub approved_at: DateTime<Utc>,
}

/// Row handed to the report renderer: an approved grade joined with its course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRow {
    pub course_name: String,
    pub credit: f64,
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: CourseType,
    pub semester: String,
}

/// Graduation-progress figures derived from approved grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub total: f64,
    pub required: f64,
    pub elective: f64,
    pub remaining: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_parse_cjk_weekday() {
        let slot: TimeSlot = "周二-3,4".parse().unwrap();
        assert_eq!(slot.weekday, "周二");
        assert_eq!(slot.periods, BTreeSet::from([3, 4]));
        assert_eq!(slot.to_string(), "周二-3,4");
    }

    #[test]
    fn test_time_slot_parse_discards_blank_periods() {
        let slot: TimeSlot = "Mon-1,,2, ".parse().unwrap();
        assert_eq!(slot.periods, BTreeSet::from([1, 2]));
    }

    #[test]
    fn test_time_slot_parse_rejects_malformed() {
        assert!("周二".parse::<TimeSlot>().is_err());
        assert!("-3,4".parse::<TimeSlot>().is_err());
        assert!("周二-".parse::<TimeSlot>().is_err());
        assert!("周二-x,y".parse::<TimeSlot>().is_err());
        assert!("周二-0".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_time_slot_conflict_needs_same_weekday_and_shared_period() {
        let a: TimeSlot = "周二-3,4".parse().unwrap();
        let b: TimeSlot = "周二-4,5".parse().unwrap();
        let c: TimeSlot = "周三-3,4".parse().unwrap();
        let d: TimeSlot = "周二-1,2".parse().unwrap();
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&c));
        assert!(!a.conflicts_with(&d));
    }
}
