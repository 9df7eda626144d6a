//! Snapshot persistence for disk-backed libraries
//!
//! A checkpoint serializes all three stores into one JSON document and
//! writes it crash-safely: the bytes go to a temp file in the data
//! directory first, then a rename moves it over `snapshot.json`. A crash
//! mid-write leaves the previous snapshot intact.

use serde::{Deserialize, Serialize};
use std::path::Path;

use circ_core::{Book, Loan, Member, Result};
use circ_store::{CatalogStore, LoanLedger, MembershipStore};

pub(crate) const SNAPSHOT_FILE_NAME: &str = "snapshot.json";
const SNAPSHOT_TMP_NAME: &str = "snapshot.json.tmp";

/// Point-in-time copy of all three stores
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    books: Vec<Book>,
    members: Vec<Member>,
    loans: Vec<Loan>,
}

impl Snapshot {
    /// Capture the current store contents
    pub(crate) fn capture(
        catalog: &CatalogStore,
        members: &MembershipStore,
        ledger: &LoanLedger,
    ) -> Self {
        Self {
            books: catalog.snapshot(),
            members: members.snapshot(),
            loans: ledger.snapshot(),
        }
    }

    /// Load the snapshot from a data directory, if one exists
    pub(crate) fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(SNAPSHOT_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    /// Write the snapshot crash-safely into a data directory
    pub(crate) fn write(&self, dir: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = dir.join(SNAPSHOT_TMP_NAME);
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, dir.join(SNAPSHOT_FILE_NAME))?;
        Ok(())
    }

    /// Rebuild the three stores from this snapshot
    pub(crate) fn restore(self) -> Result<(CatalogStore, MembershipStore, LoanLedger)> {
        Ok((
            CatalogStore::from_records(self.books)?,
            MembershipStore::from_records(self.members)?,
            LoanLedger::from_records(self.loans),
        ))
    }
}
