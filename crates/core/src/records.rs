//! Domain records: Book, Member, Loan
//!
//! Records are plain serde-friendly data. The stores own identity and
//! uniqueness; the engine is the only writer of `stock` and
//! `outstanding_debt`. Stock and debt are unsigned, so the non-negativity
//! invariants hold by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BookId, Isbn, LoanId, MemberId};

/// A catalog book with a count of available (un-loaned) copies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Server-assigned unique identifier
    pub id: BookId,
    /// Title, non-empty
    pub title: String,
    /// Author(s), non-empty
    pub author: String,
    /// Unique 13-digit ISBN
    pub isbn: Isbn,
    /// Optional publisher
    pub publisher: Option<String>,
    /// Count of currently available copies
    pub stock: u32,
}

/// Input shape for creating a Book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    /// Title, non-empty
    pub title: String,
    /// Author(s), non-empty
    pub author: String,
    /// Unique 13-digit ISBN
    pub isbn: Isbn,
    /// Optional publisher
    pub publisher: Option<String>,
    /// Initial stock
    pub stock: u32,
}

impl NewBook {
    /// Check required fields are present
    ///
    /// The ISBN is already validated by construction of [`Isbn`].
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::MissingField("title"));
        }
        if self.author.trim().is_empty() {
            return Err(Error::MissingField("author"));
        }
        Ok(())
    }
}

/// Partial update for a Book; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    /// New title
    pub title: Option<String>,
    /// New author
    pub author: Option<String>,
    /// New ISBN; uniqueness is re-checked
    pub isbn: Option<Isbn>,
    /// New publisher
    pub publisher: Option<String>,
    /// New stock count
    pub stock: Option<u32>,
}

impl BookPatch {
    /// Check updated fields are well-formed
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(Error::MissingField("title"));
        }
        if matches!(&self.author, Some(a) if a.trim().is_empty()) {
            return Err(Error::MissingField("author"));
        }
        Ok(())
    }
}

/// A registered borrower with an accruing fee balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Server-assigned unique identifier
    pub id: MemberId,
    /// Display name, non-empty
    pub name: String,
    /// Unique contact email
    pub email: String,
    /// Accumulated unpaid fees, in whole currency units
    pub outstanding_debt: u64,
}

/// Input shape for creating a Member
///
/// Members always start with zero outstanding debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    /// Display name, non-empty
    pub name: String,
    /// Unique contact email
    pub email: String,
}

impl NewMember {
    /// Check required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(Error::MissingField("email"));
        }
        Ok(())
    }
}

/// Partial update for a Member; absent fields are left unchanged
///
/// Debt is never updated through a patch; it moves only through returns
/// and debt settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPatch {
    /// New display name
    pub name: Option<String>,
    /// New email; uniqueness is re-checked
    pub email: Option<String>,
}

impl MemberPatch {
    /// Check updated fields are well-formed
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(Error::MissingField("name"));
        }
        if matches!(&self.email, Some(e) if e.trim().is_empty()) {
            return Err(Error::MissingField("email"));
        }
        Ok(())
    }
}

/// A borrowing transaction linking one book copy and one member
///
/// A loan is *active* until its single Active→Returned transition, after
/// which `return_date` and `fee` are set. Loans are never deleted; the
/// ledger is the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Ledger-assigned unique identifier
    pub id: LoanId,
    /// Borrowed book
    pub book_id: BookId,
    /// Borrowing member
    pub member_id: MemberId,
    /// When the copy left the shelf
    pub issue_date: DateTime<Utc>,
    /// Set exactly once, on return
    pub return_date: Option<DateTime<Utc>>,
    /// Late fee charged at return time, in whole currency units
    pub fee: Option<u64>,
}

impl Loan {
    /// A loan is active iff it has not been returned
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }
}
