//! Issue and return: the lending state machine
//!
//! A loan has two states, Active and Returned, and one transition between
//! them. Issue and return are the only operations that touch two stores in
//! one unit, and both acquire record guards in the global order
//! member → book → loan:
//!
//! - **Issue**: eligibility check under the member's guard, then stock −1
//!   and loan open under the book's guard. The book guard serializes
//!   racers on the last copy: exactly one wins, the rest observe the
//!   underflow and receive `OutOfStock`. The member guard pins the member
//!   against deletion until the loan exists.
//! - **Return**: debt +fee under the member's guard, stock +1 under the
//!   book's guard, and the close under the loan's guard, innermost. Each
//!   outer adjustment is applied only if everything inside it succeeded,
//!   so a losing second return fails `AlreadyReturned` at the loan guard
//!   and neither fee nor stock is re-applied.
//!
//! Timestamps flow in from the `*_at` variants so fees are testable; the
//! public entry points use the current time.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use circ_core::{BookId, Eligibility, Error, Loan, LoanId, Member, MemberId, Result};

use crate::library::Library;

/// Result of a successful return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    /// The closed loan, with `return_date` and `fee` stamped
    pub loan: Loan,
    /// Fee charged for this return
    pub fee: u64,
    /// The member's outstanding debt after the fee was applied
    pub total_debt: u64,
}

impl Library {
    /// Issue a book to a member now
    pub fn issue_book(&self, book_id: BookId, member_id: MemberId) -> Result<Loan> {
        self.issue_book_at(book_id, member_id, Utc::now())
    }

    /// Issue a book to a member at an explicit timestamp
    ///
    /// # Errors
    /// - `Error::BookNotFound` / `Error::MemberNotFound`
    /// - `Error::OutOfStock` if no copy is available (including losing a
    ///   race for the last one)
    /// - `Error::DebtLimitExceeded` if the member is ineligible
    pub fn issue_book_at(
        &self,
        book_id: BookId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Loan> {
        let book = self.catalog.get(book_id)?;
        if book.stock == 0 {
            warn!(book_id = %book_id, "issue refused: out of stock");
            return Err(Error::OutOfStock { book_id, stock: 0 });
        }

        // The member guard pins the member for the whole unit; the book
        // guard spans the stock decrement and the loan open.
        let (book, loan) = self.members.with_member(member_id, |member| {
            self.check_eligibility(member)?;
            let result = self
                .catalog
                .adjust_stock_and(book_id, -1, |_| Ok(self.ledger.open(book_id, member_id, now)));
            match result {
                Err(Error::StockWouldGoNegative { book_id, stock }) => {
                    warn!(book_id = %book_id, "issue refused: lost race for last copy");
                    Err(Error::OutOfStock { book_id, stock })
                }
                other => other,
            }
        })?;
        info!(
            loan_id = %loan.id,
            book_id = %book_id,
            member_id = %member_id,
            stock = book.stock,
            "book issued"
        );
        Ok(loan)
    }

    /// Return a borrowed book now
    pub fn return_book(&self, loan_id: LoanId) -> Result<ReturnOutcome> {
        self.return_book_at(loan_id, Utc::now())
    }

    /// Return a borrowed book at an explicit timestamp
    ///
    /// The fee is `floor(whole elapsed days) * daily_fee`, clamped at zero
    /// days; a same-day return accrues nothing. There is no cap and no
    /// grace period.
    ///
    /// # Errors
    /// - `Error::LoanNotFound`
    /// - `Error::AlreadyReturned` on a second return
    pub fn return_book_at(&self, loan_id: LoanId, now: DateTime<Utc>) -> Result<ReturnOutcome> {
        let loan = self.ledger.get(loan_id)?;
        if !loan.is_active() {
            return Err(Error::AlreadyReturned(loan_id));
        }
        // issue_date is immutable once the loan is open, so the fee can be
        // computed outside the guards; the close re-checks Active inside.
        let days = (now - loan.issue_date).num_days().max(0) as u64;
        let fee = self.policy.fee_for_days(days);

        let (member, closed) = self.members.adjust_debt_and(loan.member_id, fee as i64, |_| {
            let (_, closed) = self.catalog.adjust_stock_and(loan.book_id, 1, |_| {
                self.ledger.close_with(loan_id, now, |_| Ok(fee))
            })?;
            Ok(closed)
        })?;
        info!(
            loan_id = %loan_id,
            fee,
            total_debt = member.outstanding_debt,
            "book returned"
        );
        Ok(ReturnOutcome {
            loan: closed,
            fee,
            total_debt: member.outstanding_debt,
        })
    }

    fn check_eligibility(&self, member: &Member) -> Result<()> {
        match self.policy.assess(member.outstanding_debt) {
            Eligibility::Ineligible => {
                warn!(
                    member_id = %member.id,
                    debt = member.outstanding_debt,
                    limit = self.policy.debt_limit,
                    "issue refused: debt limit exceeded"
                );
                Err(Error::DebtLimitExceeded {
                    member_id: member.id,
                    debt: member.outstanding_debt,
                    limit: self.policy.debt_limit,
                })
            }
            Eligibility::ApproachingLimit => {
                debug!(member_id = %member.id, debt = member.outstanding_debt, "member approaching debt limit");
                Ok(())
            }
            Eligibility::Eligible => Ok(()),
        }
    }
}
