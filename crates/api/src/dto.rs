//! Request and response shapes for the API boundary
//!
//! Inputs carry raw strings (an ISBN arrives unvalidated); responses
//! mirror the domain records plus display-only derivations such as the
//! member eligibility flag. Identifier fields serialize as UUID strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use circ_core::{
    Book, BookId, Eligibility, LendingPolicy, Loan, LoanId, Member, MemberId,
};

/// Input for creating a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInput {
    /// Title
    pub title: String,
    /// Author(s)
    pub author: String,
    /// ISBN; validated server-side as 13 digits
    pub isbn: String,
    /// Optional publisher
    #[serde(default)]
    pub publisher: Option<String>,
    /// Initial stock, defaults to 0
    #[serde(default)]
    pub stock: u32,
}

/// Partial update for a book; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    /// New title
    pub title: Option<String>,
    /// New author
    pub author: Option<String>,
    /// New ISBN
    pub isbn: Option<String>,
    /// New publisher
    pub publisher: Option<String>,
    /// New stock count
    pub stock: Option<u32>,
}

/// A book as rendered to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDto {
    /// Identifier
    pub id: BookId,
    /// Title
    pub title: String,
    /// Author(s)
    pub author: String,
    /// ISBN digits
    pub isbn: String,
    /// Publisher, if known
    pub publisher: Option<String>,
    /// Available copies
    pub stock: u32,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            isbn: book.isbn.as_str().to_string(),
            publisher: book.publisher,
            stock: book.stock,
        }
    }
}

/// Input for registering a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberInput {
    /// Display name
    pub name: String,
    /// Contact email, unique
    pub email: String,
}

/// Partial update for a member; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    /// New display name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
}

/// A member as rendered to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    /// Identifier
    pub id: MemberId,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Accumulated unpaid fees
    pub outstanding_debt: u64,
    /// Borrowing eligibility under the active policy, for display
    pub eligibility: Eligibility,
}

impl MemberDto {
    /// Render a member, deriving the eligibility flag from the policy
    pub fn new(member: Member, policy: &LendingPolicy) -> Self {
        let eligibility = policy.assess(member.outstanding_debt);
        Self {
            id: member.id,
            name: member.name,
            email: member.email,
            outstanding_debt: member.outstanding_debt,
            eligibility,
        }
    }
}

/// Input for issuing a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Book to issue
    pub book_id: BookId,
    /// Borrowing member
    pub member_id: MemberId,
}

/// A loan as rendered to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDto {
    /// Identifier
    pub id: LoanId,
    /// Borrowed book
    pub book_id: BookId,
    /// Borrowing member
    pub member_id: MemberId,
    /// Issue timestamp
    pub issue_date: DateTime<Utc>,
    /// Return timestamp, if closed
    pub return_date: Option<DateTime<Utc>>,
    /// Fee charged at return, if closed
    pub fee: Option<u64>,
}

impl From<Loan> for LoanDto {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id,
            book_id: loan.book_id,
            member_id: loan.member_id,
            issue_date: loan.issue_date,
            return_date: loan.return_date,
            fee: loan.fee,
        }
    }
}

/// An active loan with its book and member joined in for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoanDto {
    /// Loan identifier
    pub id: LoanId,
    /// Snapshot of the borrowed book
    pub book: BookDto,
    /// Snapshot of the borrowing member
    pub member: MemberDto,
    /// Issue timestamp
    pub issue_date: DateTime<Utc>,
}

/// Response to a successful return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReceipt {
    /// Human-readable confirmation
    pub message: String,
    /// Fee charged for this return
    pub fee: u64,
    /// The member's outstanding debt after the fee
    pub total_debt: u64,
}
