//! Command surface. Thin dispatch into the use-case services.
//!
//! One-shot subcommands rather than a prompt loop; records operations
//! are scripted by an external caller. No business logic here.

use crate::adapters::reports::csv_export;
use crate::domain::{
    Course, CourseType, DomainError, Gender, Student, TimeSlot, TranscriptRow,
};
use crate::ports::{CourseStore, StudentStore};
use crate::usecases::{EnrollmentService, GradeService, ReportService};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "registrar",
    version,
    about = "Academic records: enrollment eligibility, grade approval, GPA reports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register a student.
    AddStudent {
        id: String,
        name: String,
        /// "male" or "female".
        #[arg(long, default_value = "male")]
        gender: String,
        #[arg(long, default_value = "")]
        class_label: String,
        /// Admission date label, e.g. 2023-09-01.
        #[arg(long, default_value = "")]
        enrolled_on: String,
    },
    /// Add a course to the catalogue.
    AddCourse {
        code: String,
        name: String,
        #[arg(long)]
        credit: f64,
        /// "required" or "elective".
        #[arg(long, default_value = "required")]
        kind: String,
        #[arg(long, default_value = "")]
        semester: String,
        /// Prerequisite course code. Repeatable.
        #[arg(long = "prereq")]
        prereqs: Vec<String>,
        /// Weekly meeting slot, e.g. "周二-3,4".
        #[arg(long)]
        slot: Option<String>,
    },
    /// Enroll a student into a course (eligibility-checked).
    Enroll { student: String, course: String },
    /// Mark an enrollment withdrawn.
    Withdraw { student: String, course: String },
    /// Mark an enrollment completed.
    Complete { student: String, course: String },
    /// Submit a score; the grade lands in pending.
    SubmitGrade {
        student: String,
        course: String,
        score: f64,
    },
    /// Approve every pending grade under a course.
    ApproveGrades { course: String, approver: String },
    /// Reopen an approved grade for resubmission.
    ReopenGrade { student: String, course: String },
    /// Credit-weighted GPA over approved grades.
    Gpa { student: String },
    /// Credit totals and graduation progress.
    Credits { student: String },
    /// Approved-grade transcript.
    Transcript {
        student: String,
        /// Write CSV to this path instead of printing a table.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

/// Everything the dispatcher needs, wired by main.
pub struct Services {
    pub enrollment: EnrollmentService,
    pub grades: GradeService,
    pub reports: ReportService,
    pub students: Arc<dyn StudentStore>,
    pub courses: Arc<dyn CourseStore>,
}

pub async fn run(cli: Cli, services: &Services) -> Result<(), DomainError> {
    match cli.command {
        Command::AddStudent {
            id,
            name,
            gender,
            class_label,
            enrolled_on,
        } => {
            let student = Student {
                id,
                name,
                gender: gender.parse::<Gender>()?,
                class_label,
                enrolled_on,
                credits_earned: 0.0,
            };
            services.students.add_student(&student).await?;
            println!("student '{}' registered", student.id);
        }
        Command::AddCourse {
            code,
            name,
            credit,
            kind,
            semester,
            prereqs,
            slot,
        } => {
            if credit < 0.0 {
                return Err(DomainError::Validation(format!(
                    "credit {credit} must be non-negative"
                )));
            }
            let course = Course {
                code,
                name,
                credit,
                kind: kind.parse::<CourseType>()?,
                semester,
                prerequisites: prereqs,
                time_slot: slot.as_deref().map(str::parse::<TimeSlot>).transpose()?,
            };
            services.courses.add_course(&course).await?;
            println!("course '{}' added", course.code);
        }
        Command::Enroll { student, course } => {
            let enrollment = services.enrollment.enroll(&student, &course).await?;
            println!(
                "enrolled '{}' in '{}' at {}",
                enrollment.student_id, enrollment.course_code, enrollment.enrolled_at
            );
        }
        Command::Withdraw { student, course } => {
            services.enrollment.withdraw(&student, &course).await?;
            println!("withdrew '{student}' from '{course}'");
        }
        Command::Complete { student, course } => {
            services.enrollment.complete(&student, &course).await?;
            println!("completed '{student}' in '{course}'");
        }
        Command::SubmitGrade {
            student,
            course,
            score,
        } => {
            services.grades.submit(&student, &course, score).await?;
            println!("grade {score} submitted for '{student}'/'{course}' (pending)");
        }
        Command::ApproveGrades { course, approver } => {
            let count = services.grades.approve(&course, &approver).await?;
            println!("approved {count} grade(s) under '{course}'");
        }
        Command::ReopenGrade { student, course } => {
            services.grades.reopen(&student, &course).await?;
            println!("reopened grade for '{student}'/'{course}'");
        }
        Command::Gpa { student } => {
            let gpa = services.reports.gpa(&student).await?;
            println!("{gpa:.2}");
        }
        Command::Credits { student } => {
            let summary = services.reports.credit_summary(&student).await?;
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| DomainError::Store(e.to_string()))?;
            println!("{json}");
        }
        Command::Transcript { student, csv } => {
            let rows = services.reports.transcript(&student).await?;
            match csv {
                Some(path) => {
                    let out = csv_export::transcript_to_csv(&rows)
                        .map_err(|e| DomainError::Store(e.to_string()))?;
                    tokio::fs::write(&path, out)
                        .await
                        .map_err(|e| DomainError::Store(e.to_string()))?;
                    println!("transcript written to {}", path.display());
                }
                None => print_transcript(&rows),
            }
        }
    }
    Ok(())
}

fn print_transcript(rows: &[TranscriptRow]) {
    println!(
        "{:<24} {:>6} {:>6} {:<9} {:<10}",
        "course", "credit", "score", "type", "semester"
    );
    for row in rows {
        println!(
            "{:<24} {:>6} {:>6} {:<9} {:<10}",
            row.course_name,
            row.credit,
            row.score,
            row.kind.as_str(),
            row.semester
        );
    }
}
