//! CircDB - Embedded circulation database for library inventory and lending
//!
//! CircDB tracks books, members, and borrowing transactions; enforces
//! borrowing eligibility and debt limits; computes late fees on return;
//! and reconciles batches of externally-sourced book records into the
//! catalog without creating duplicates.
//!
//! # Quick Start
//!
//! ```ignore
//! use circdb::{Library, LibraryService, BookInput, MemberInput, IssueRequest};
//! use std::sync::Arc;
//!
//! // Open a disk-backed library (or Library::ephemeral() for in-memory)
//! let library = Arc::new(Library::open("/path/to/data")?);
//! let service = LibraryService::new(library);
//!
//! let book = service.create_book(BookInput {
//!     title: "Dune".into(),
//!     author: "Frank Herbert".into(),
//!     isbn: "9780441013593".into(),
//!     publisher: None,
//!     stock: 2,
//! })?;
//! let member = service.create_member(MemberInput {
//!     name: "Ada".into(),
//!     email: "ada@example.com".into(),
//! })?;
//!
//! let loan = service.issue(IssueRequest { book_id: book.id, member_id: member.id })?;
//! let receipt = service.return_book(loan.id)?;
//! ```
//!
//! # Architecture
//!
//! The engine ([`Library`]) owns three keyed stores — catalog, membership,
//! loan ledger — and is the only writer that touches stock and debt
//! jointly. The API layer ([`LibraryService`]) is a stateless façade
//! translating requests and responses; it carries no business logic.

// Re-export the public API
pub use circ_api::{
    ActiveLoanDto, ApiError, BookDescriptor, BookDto, BookInput, BookUpdate, ImportReport,
    IssueRequest, LibraryService, LoanDto, MemberDto, MemberInput, MemberUpdate, ReturnReceipt,
};
pub use circ_core::{
    Book, BookId, BookPatch, Eligibility, Error, ErrorKind, Isbn, LendingPolicy, Loan, LoanId,
    Member, MemberId, MemberPatch, NewBook, NewMember, Result,
};
pub use circ_engine::{CircConfig, Library, RetryConfig, ReturnOutcome, CONFIG_FILE_NAME};
pub use circ_store::{CatalogStore, LoanLedger, MembershipStore};
