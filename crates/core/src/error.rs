//! Error types for the circulation system
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error belongs to one of five classes (see [`ErrorKind`]): validation
//! failures the caller can fix locally, missing records, conflicts with
//! existing state, business-rule refusals, and transient store failures. Only
//! the transient class is eligible for automatic retry. Business-rule variants
//! carry the current stock or debt so the caller can explain the refusal.

use crate::types::{BookId, Isbn, LoanId, MemberId};
use serde::Serialize;
use std::io;
use thiserror::Error;

/// Result type alias for circulation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of an [`Error`], used by the API boundary to pick the
/// right rendering for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; recoverable by the caller correcting it
    Validation,
    /// Referenced record does not exist
    NotFound,
    /// Operation conflicts with existing state
    Conflict,
    /// Refused by lending policy; input was well-formed
    BusinessRule,
    /// Store temporarily unavailable; eligible for bounded retry
    Transient,
}

/// Error types for the circulation system
#[derive(Debug, Error)]
pub enum Error {
    /// ISBN is not exactly 13 ASCII digits
    #[error("invalid ISBN {0:?}: expected exactly 13 digits")]
    InvalidIsbn(String),

    /// A required field was missing or empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Configuration file could not be parsed or failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Book id unknown to the catalog
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    /// Member id unknown to the membership store
    #[error("member not found: {0}")]
    MemberNotFound(MemberId),

    /// Loan id unknown to the ledger
    #[error("loan not found: {0}")]
    LoanNotFound(LoanId),

    /// A catalog record with this ISBN already exists
    #[error("a book with ISBN {0} already exists")]
    DuplicateIsbn(Isbn),

    /// A member record with this email already exists
    #[error("a member with email {0:?} already exists")]
    DuplicateEmail(String),

    /// The loan was already closed by an earlier return
    #[error("loan {0} was already returned")]
    AlreadyReturned(LoanId),

    /// A stock adjustment would drive the count below zero
    #[error("stock adjustment on book {book_id} would go negative (current stock {stock})")]
    StockWouldGoNegative {
        /// Book whose stock was being adjusted
        book_id: BookId,
        /// Stock at the time of the refused adjustment
        stock: u32,
    },

    /// A debt adjustment would drive the balance below zero
    #[error("debt adjustment on member {member_id} would go negative (current debt {debt})")]
    DebtWouldGoNegative {
        /// Member whose debt was being adjusted
        member_id: MemberId,
        /// Debt at the time of the refused adjustment
        debt: u64,
    },

    /// No copies available to issue
    #[error("book {book_id} is out of stock (current stock {stock})")]
    OutOfStock {
        /// Book that was requested
        book_id: BookId,
        /// Stock observed when the issue was refused
        stock: u32,
    },

    /// Member's outstanding debt is at or over the lending limit
    #[error("member {member_id} has outstanding debt {debt}, at or over the limit of {limit}")]
    DebtLimitExceeded {
        /// Member that was refused
        member_id: MemberId,
        /// Outstanding debt observed at issue time
        debt: u64,
        /// Configured debt limit
        limit: u64,
    },

    /// Member cannot be deleted while owing fees
    #[error("member {member_id} has outstanding debt of {debt} and cannot be deleted")]
    HasOutstandingDebt {
        /// Member whose deletion was refused
        member_id: MemberId,
        /// Outstanding debt at the time of the refusal
        debt: u64,
    },

    /// Record cannot be deleted while loans referencing it are active
    #[error("{entity} {id} has active loans and cannot be deleted")]
    HasActiveLoans {
        /// "book" or "member"
        entity: &'static str,
        /// Identifier of the pinned record, formatted for display
        id: String,
    },

    /// Store temporarily unavailable
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the persistence layer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Snapshot serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Classify this error for the API boundary
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidIsbn(_) | Error::MissingField(_) | Error::InvalidConfig(_) => {
                ErrorKind::Validation
            }
            Error::BookNotFound(_) | Error::MemberNotFound(_) | Error::LoanNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::DuplicateIsbn(_)
            | Error::DuplicateEmail(_)
            | Error::AlreadyReturned(_)
            | Error::StockWouldGoNegative { .. }
            | Error::DebtWouldGoNegative { .. } => ErrorKind::Conflict,
            Error::OutOfStock { .. }
            | Error::DebtLimitExceeded { .. }
            | Error::HasOutstandingDebt { .. }
            | Error::HasActiveLoans { .. } => ErrorKind::BusinessRule,
            Error::Unavailable(_) | Error::Io(_) | Error::Serialization(_) => ErrorKind::Transient,
        }
    }

    /// Refusal to delete a book with active loans
    pub fn book_has_active_loans(id: BookId) -> Self {
        Error::HasActiveLoans {
            entity: "book",
            id: id.to_string(),
        }
    }

    /// Refusal to delete a member with active loans
    pub fn member_has_active_loans(id: MemberId) -> Self {
        Error::HasActiveLoans {
            entity: "member",
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_isbn() {
        let err = Error::InvalidIsbn("12ab".to_string());
        let msg = err.to_string();
        assert!(msg.contains("invalid ISBN"));
        assert!(msg.contains("12ab"));
    }

    #[test]
    fn test_error_display_out_of_stock() {
        let book_id = BookId::new();
        let err = Error::OutOfStock { book_id, stock: 0 };
        let msg = err.to_string();
        assert!(msg.contains("out of stock"));
        assert!(msg.contains(&book_id.to_string()));
    }

    #[test]
    fn test_error_display_debt_limit() {
        let err = Error::DebtLimitExceeded {
            member_id: MemberId::new(),
            debt: 510,
            limit: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("510"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn test_error_display_has_active_loans() {
        let id = BookId::new();
        let err = Error::book_has_active_loans(id);
        let msg = err.to_string();
        assert!(msg.contains("book"));
        assert!(msg.contains("active loans"));
    }

    #[test]
    fn test_kind_validation() {
        assert_eq!(
            Error::InvalidIsbn(String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::MissingField("title").kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_not_found() {
        assert_eq!(
            Error::BookNotFound(BookId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::LoanNotFound(LoanId::new()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_kind_conflict() {
        let isbn = Isbn::parse("1111111111111").unwrap();
        assert_eq!(Error::DuplicateIsbn(isbn).kind(), ErrorKind::Conflict);
        assert_eq!(
            Error::AlreadyReturned(LoanId::new()).kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_kind_business_rule() {
        assert_eq!(
            Error::OutOfStock {
                book_id: BookId::new(),
                stock: 0
            }
            .kind(),
            ErrorKind::BusinessRule
        );
        assert_eq!(
            Error::HasOutstandingDebt {
                member_id: MemberId::new(),
                debt: 40
            }
            .kind(),
            ErrorKind::BusinessRule
        );
    }

    #[test]
    fn test_kind_transient() {
        assert_eq!(
            Error::Unavailable("locked".to_string()).kind(),
            ErrorKind::Transient
        );
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io_err).kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_error_from_serde_json() {
        let result: std::result::Result<u64, serde_json::Error> = serde_json::from_str("not json");
        let err: Error = result.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::BusinessRule).unwrap();
        assert_eq!(json, "\"business_rule\"");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<u32> {
            Ok(7)
        }
        assert_eq!(returns_result().unwrap(), 7);
    }
}
