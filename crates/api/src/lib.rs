//! Public API layer for CircDB
//!
//! This crate is the request/response boundary of the lending engine. It
//! carries no business logic: every method of [`LibraryService`] desugars
//! to exactly one engine call, translated to and from serde-serializable
//! DTOs so a thin client can render the result without touching domain
//! types.
//!
//! ## Intents
//!
//! - Book and Member CRUD
//! - Issue a book, return a book
//! - Active-loan listing with embedded Book and Member snapshots
//!   (joined at query time, never stored denormalized)
//! - Batch import of external book descriptors
//!
//! ## Errors
//!
//! Failures cross the boundary as [`ApiError`], whose `kind` field
//! distinguishes field-level validation failures from missing records,
//! conflicts, business-rule refusals, and transient store errors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dto;
pub mod error;
pub mod service;

pub use dto::{
    ActiveLoanDto, BookDto, BookInput, BookUpdate, IssueRequest, LoanDto, MemberDto, MemberInput,
    MemberUpdate, ReturnReceipt,
};
pub use error::ApiError;
pub use service::{ApiResult, LibraryService};

// Import DTOs are the engine's own types; re-export for wire use
pub use circ_engine::{BookDescriptor, ImportReport};
