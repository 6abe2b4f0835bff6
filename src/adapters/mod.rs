//! Infrastructure adapters. Implement outbound ports and the command
//! surface. Map infrastructure errors to DomainError.

pub mod cli;
pub mod persistence;
pub mod reports;
