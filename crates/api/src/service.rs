//! LibraryService: the façade routing intents to the engine
//!
//! ## Design
//!
//! LibraryService is a stateless façade over the engine. It holds no state
//! beyond an `Arc<Library>` reference; it is `Send + Sync` and cheap to
//! clone, so one instance can serve concurrent callers.
//!
//! Every method desugars to exactly one engine call plus DTO translation.
//! Validation that belongs to the boundary (parsing an ISBN string) happens
//! here; everything else is the engine's.

use std::sync::Arc;

use circ_core::{BookId, BookPatch, Isbn, LoanId, MemberId, MemberPatch, NewBook, NewMember};
use circ_engine::{BookDescriptor, ImportReport, Library};

use crate::dto::{
    ActiveLoanDto, BookDto, BookInput, BookUpdate, IssueRequest, LoanDto, MemberDto, MemberInput,
    MemberUpdate, ReturnReceipt,
};
use crate::error::ApiError;

/// Result type for boundary operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Request/response façade over a [`Library`]
#[derive(Clone)]
pub struct LibraryService {
    library: Arc<Library>,
}

impl LibraryService {
    /// Create a service over an open library
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// The underlying library
    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    // ========== Books ==========

    /// List all cataloged books
    pub fn list_books(&self) -> Vec<BookDto> {
        self.library
            .list_books()
            .into_iter()
            .map(BookDto::from)
            .collect()
    }

    /// Create a book
    pub fn create_book(&self, input: BookInput) -> ApiResult<BookDto> {
        let isbn = Isbn::parse(&input.isbn)?;
        let book = self.library.create_book(NewBook {
            title: input.title,
            author: input.author,
            isbn,
            publisher: input.publisher,
            stock: input.stock,
        })?;
        Ok(book.into())
    }

    /// Fetch one book
    pub fn get_book(&self, id: BookId) -> ApiResult<BookDto> {
        Ok(self.library.get_book(id)?.into())
    }

    /// Update a book
    pub fn update_book(&self, id: BookId, update: BookUpdate) -> ApiResult<BookDto> {
        let isbn = update.isbn.as_deref().map(Isbn::parse).transpose()?;
        let book = self.library.update_book(
            id,
            BookPatch {
                title: update.title,
                author: update.author,
                isbn,
                publisher: update.publisher,
                stock: update.stock,
            },
        )?;
        Ok(book.into())
    }

    /// Delete a book; refused while copies are on loan
    pub fn delete_book(&self, id: BookId) -> ApiResult<()> {
        self.library.remove_book(id)?;
        Ok(())
    }

    // ========== Members ==========

    /// List all members with their eligibility flags
    pub fn list_members(&self) -> Vec<MemberDto> {
        let policy = self.library.policy();
        self.library
            .list_members()
            .into_iter()
            .map(|m| MemberDto::new(m, policy))
            .collect()
    }

    /// Register a member
    pub fn create_member(&self, input: MemberInput) -> ApiResult<MemberDto> {
        let member = self.library.create_member(NewMember {
            name: input.name,
            email: input.email,
        })?;
        Ok(MemberDto::new(member, self.library.policy()))
    }

    /// Fetch one member
    pub fn get_member(&self, id: MemberId) -> ApiResult<MemberDto> {
        let member = self.library.get_member(id)?;
        Ok(MemberDto::new(member, self.library.policy()))
    }

    /// Update a member
    pub fn update_member(&self, id: MemberId, update: MemberUpdate) -> ApiResult<MemberDto> {
        let member = self.library.update_member(
            id,
            MemberPatch {
                name: update.name,
                email: update.email,
            },
        )?;
        Ok(MemberDto::new(member, self.library.policy()))
    }

    /// Delete a member; refused while they owe fees or hold loans
    pub fn delete_member(&self, id: MemberId) -> ApiResult<()> {
        self.library.remove_member(id)?;
        Ok(())
    }

    // ========== Lending ==========

    /// Issue a book to a member
    pub fn issue(&self, request: IssueRequest) -> ApiResult<LoanDto> {
        let loan = self.library.issue_book(request.book_id, request.member_id)?;
        Ok(loan.into())
    }

    /// Return a borrowed book
    pub fn return_book(&self, loan_id: LoanId) -> ApiResult<ReturnReceipt> {
        let outcome = self.library.return_book(loan_id)?;
        Ok(ReturnReceipt {
            message: "Book returned successfully".to_string(),
            fee: outcome.fee,
            total_debt: outcome.total_debt,
        })
    }

    /// Active loans with book and member snapshots joined in
    ///
    /// The join happens at query time against live store state; nothing
    /// is denormalized onto the loan.
    pub fn active_loans(&self) -> Vec<ActiveLoanDto> {
        let policy = self.library.policy();
        self.library
            .list_active_loans()
            .into_iter()
            .filter_map(|loan| {
                let book = self.library.get_book(loan.book_id).ok()?;
                let member = self.library.get_member(loan.member_id).ok()?;
                Some(ActiveLoanDto {
                    id: loan.id,
                    book: book.into(),
                    member: MemberDto::new(member, policy),
                    issue_date: loan.issue_date,
                })
            })
            .collect()
    }

    // ========== Import ==========

    /// Reconcile a batch of external book descriptors into the catalog
    pub fn import(&self, descriptors: Vec<BookDescriptor>) -> ImportReport {
        self.library.import_batch(descriptors)
    }
}
