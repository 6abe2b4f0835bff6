//! registrar: academic records core with Hexagonal Architecture.
//!
//! Enrollment eligibility, grade approval workflow, and GPA/credit
//! reporting over a SQLite record store.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
