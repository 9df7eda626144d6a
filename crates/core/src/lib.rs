//! Core types for CircDB
//!
//! This crate defines the foundational types used throughout the system:
//! - BookId / MemberId / LoanId: unique record identifiers
//! - Isbn: validated 13-digit book number
//! - Book / Member / Loan: domain records and their input shapes
//! - LendingPolicy: debt thresholds and the daily late fee
//! - Error: error type hierarchy with the five-class taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod policy;
pub mod records;
pub mod types;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use policy::{Eligibility, LendingPolicy};
pub use records::{Book, BookPatch, Loan, Member, MemberPatch, NewBook, NewMember};
pub use types::{BookId, Isbn, LoanId, MemberId};
