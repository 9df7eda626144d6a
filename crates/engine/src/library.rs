//! Library: the aggregate owning all circulation state
//!
//! A [`Library`] owns the catalog, membership store, and loan ledger, plus
//! the lending policy. It comes in two persistence modes:
//!
//! - **Disk-backed** (`Library::open`): state lives in a data directory
//!   with a `circ.toml` config and a JSON snapshot written by
//!   [`Library::checkpoint`]. A directory can be open in at most one
//!   `Library` at a time, enforced by a process-wide registry.
//! - **Ephemeral** (`Library::ephemeral`): no files, state dies with the
//!   value. Used by tests and embedding callers that persist elsewhere.
//!
//! Record CRUD passes through to the stores; the delete operations add the
//! engine-owned refusals (`HasActiveLoans`, `HasOutstandingDebt`). Issue,
//! return, and import live in the `lending` and `import` modules as
//! further `impl Library` blocks.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use circ_core::{
    Book, BookId, BookPatch, Error, LendingPolicy, Loan, LoanId, Member, MemberId, MemberPatch,
    NewBook, NewMember, Result,
};
use circ_store::{CatalogStore, LoanLedger, MembershipStore};

use crate::config::CircConfig;
use crate::persist::Snapshot;
use crate::retry::{run_with_retry, RetryConfig};

/// Data directories currently held by an open Library in this process
static OPEN_LIBRARIES: Lazy<DashMap<PathBuf, ()>> = Lazy::new(DashMap::new);

/// The lending engine's aggregate root
#[derive(Debug)]
pub struct Library {
    pub(crate) catalog: CatalogStore,
    pub(crate) members: MembershipStore,
    pub(crate) ledger: LoanLedger,
    pub(crate) policy: LendingPolicy,
    retry: RetryConfig,
    data_dir: Option<PathBuf>,
}

impl Library {
    /// Create an in-memory library with the default policy
    pub fn ephemeral() -> Self {
        Self::with_policy(LendingPolicy::default())
    }

    /// Create an in-memory library with an explicit policy
    pub fn with_policy(policy: LendingPolicy) -> Self {
        Self {
            catalog: CatalogStore::new(),
            members: MembershipStore::new(),
            ledger: LoanLedger::new(),
            policy,
            retry: RetryConfig::default(),
            data_dir: None,
        }
    }

    /// Open (or initialize) a disk-backed library in `dir`
    ///
    /// Creates the directory and a default `circ.toml` on first open, and
    /// loads the latest snapshot if one exists.
    ///
    /// # Errors
    /// - `Error::Unavailable` if the directory is already open in this
    ///   process
    /// - `Error::InvalidConfig` for an unreadable or incoherent `circ.toml`
    /// - any snapshot load failure
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let dir = dir.canonicalize()?;
        match OPEN_LIBRARIES.entry(dir.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Error::Unavailable(format!(
                    "library already open at {}",
                    dir.display()
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
            }
        }
        match Self::open_claimed(&dir) {
            Ok(library) => Ok(library),
            Err(e) => {
                OPEN_LIBRARIES.remove(&dir);
                Err(e)
            }
        }
    }

    fn open_claimed(dir: &Path) -> Result<Self> {
        let config = CircConfig::load_or_init(dir)?;
        let (catalog, members, ledger) = match Snapshot::load(dir)? {
            Some(snapshot) => snapshot.restore()?,
            None => (
                CatalogStore::new(),
                MembershipStore::new(),
                LoanLedger::new(),
            ),
        };
        info!(dir = %dir.display(), books = catalog.len(), "library opened");
        Ok(Self {
            catalog,
            members,
            ledger,
            policy: config.policy,
            retry: RetryConfig::default(),
            data_dir: Some(dir.to_path_buf()),
        })
    }

    /// Write a snapshot of all three stores to the data directory
    ///
    /// Transient I/O failures are retried within the configured bound.
    ///
    /// # Errors
    /// `Error::Unavailable` for an ephemeral library.
    pub fn checkpoint(&self) -> Result<()> {
        let dir = self.data_dir.as_deref().ok_or_else(|| {
            Error::Unavailable("ephemeral library has no data directory".to_string())
        })?;
        let snapshot = Snapshot::capture(&self.catalog, &self.members, &self.ledger);
        run_with_retry(&self.retry, || snapshot.write(dir))?;
        info!(dir = %dir.display(), "checkpoint written");
        Ok(())
    }

    /// The active lending policy
    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// The catalog store
    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// The membership store
    pub fn members(&self) -> &MembershipStore {
        &self.members
    }

    /// The loan ledger
    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    /// Data directory of a disk-backed library
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    // ========== Book operations ==========

    /// Add a book to the catalog
    pub fn create_book(&self, new: NewBook) -> Result<Book> {
        self.catalog.create(new)
    }

    /// Fetch a book by id
    pub fn get_book(&self, id: BookId) -> Result<Book> {
        self.catalog.get(id)
    }

    /// All cataloged books
    pub fn list_books(&self) -> Vec<Book> {
        self.catalog.list()
    }

    /// Apply a partial update to a book
    pub fn update_book(&self, id: BookId, patch: BookPatch) -> Result<Book> {
        self.catalog.update(id, patch)
    }

    /// Delete a book, refusing while copies are on loan
    ///
    /// The check runs under the book's record guard, so it cannot race an
    /// in-flight issue of the same book.
    pub fn remove_book(&self, id: BookId) -> Result<Book> {
        self.catalog.remove_if(id, |book| {
            if self.ledger.has_active_for_book(book.id) {
                warn!(book_id = %book.id, "delete refused: book has active loans");
                return Err(Error::book_has_active_loans(book.id));
            }
            Ok(())
        })
    }

    // ========== Member operations ==========

    /// Register a member
    pub fn create_member(&self, new: NewMember) -> Result<Member> {
        self.members.create(new)
    }

    /// Fetch a member by id
    pub fn get_member(&self, id: MemberId) -> Result<Member> {
        self.members.get(id)
    }

    /// All registered members
    pub fn list_members(&self) -> Vec<Member> {
        self.members.list()
    }

    /// Apply a partial update to a member
    pub fn update_member(&self, id: MemberId, patch: MemberPatch) -> Result<Member> {
        self.members.update(id, patch)
    }

    /// Delete a member, refusing while they owe fees or hold loans
    ///
    /// The refusals apply regardless of who requests the deletion, and run
    /// under the member's record guard so they cannot race an in-flight
    /// issue or return for the same member.
    pub fn remove_member(&self, id: MemberId) -> Result<Member> {
        self.members.remove_if(id, |member| {
            if member.outstanding_debt > 0 {
                warn!(member_id = %member.id, debt = member.outstanding_debt, "delete refused: outstanding debt");
                return Err(Error::HasOutstandingDebt {
                    member_id: member.id,
                    debt: member.outstanding_debt,
                });
            }
            if self.ledger.has_active_for_member(member.id) {
                warn!(member_id = %member.id, "delete refused: member has active loans");
                return Err(Error::member_has_active_loans(member.id));
            }
            Ok(())
        })
    }

    // ========== Ledger views ==========

    /// Fetch a loan by id
    pub fn get_loan(&self, id: LoanId) -> Result<Loan> {
        self.ledger.get(id)
    }

    /// All loans, oldest first (audit trail)
    pub fn list_loans(&self) -> Vec<Loan> {
        self.ledger.list()
    }

    /// Loans currently out, oldest first
    pub fn list_active_loans(&self) -> Vec<Loan> {
        self.ledger.list_active()
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if let Some(dir) = &self.data_dir {
            OPEN_LIBRARIES.remove(dir);
        }
    }
}
