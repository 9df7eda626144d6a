//! Import reconciliation: merging external book records by ISBN
//!
//! The import path consumes descriptors fetched by an external catalog
//! collaborator. Each descriptor is validated, then reconciled against the
//! catalog by ISBN: a known ISBN gains one copy of stock (merged), an
//! unknown one becomes a new record with stock 1 (imported), malformed
//! input is skipped. One item failing never aborts the batch.
//!
//! Under concurrent imports, the catalog's per-ISBN serialization means a
//! create can lose a race and surface `DuplicateIsbn`; the loser retries
//! once as a merge. Re-importing an identical batch therefore never creates
//! duplicate records — it only merges stock.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use circ_core::{Error, Isbn, NewBook};

use crate::library::Library;

/// Column widths of the catalog fields fed by imports
const MAX_TITLE_LEN: usize = 200;
const MAX_AUTHORS_LEN: usize = 500;
const MAX_PUBLISHER_LEN: usize = 200;

/// An externally-sourced book record
///
/// This is the external collaborator's shape: `authors` (plural) maps onto
/// the catalog's author field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDescriptor {
    /// Title as reported by the source
    pub title: String,
    /// Author list as one string
    pub authors: String,
    /// Claimed ISBN; validated before reconciliation
    pub isbn: String,
    /// Optional publisher
    #[serde(default)]
    pub publisher: Option<String>,
}

/// Outcome of a batch import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Human-readable summary
    pub message: String,
    /// Descriptors that became new catalog records
    pub imported: usize,
    /// Descriptors folded into an existing record as one more copy
    pub merged: usize,
    /// Descriptors dropped for invalid or failing input
    pub skipped: usize,
    /// Descriptors processed
    pub total: usize,
    /// Per-item failure descriptions, in input order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Truncate to a maximum number of characters, respecting boundaries
fn truncated(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

enum ItemOutcome {
    Imported,
    Merged,
    Skipped(String),
}

impl Library {
    /// Reconcile a batch of external book descriptors into the catalog
    ///
    /// Items are processed in input order; the batch never fails as a
    /// whole. `imported == 0` with no errors just means nothing was new.
    pub fn import_batch(&self, descriptors: Vec<BookDescriptor>) -> ImportReport {
        let mut report = ImportReport {
            total: descriptors.len(),
            ..Default::default()
        };
        for descriptor in descriptors {
            match self.reconcile_one(&descriptor) {
                ItemOutcome::Imported => report.imported += 1,
                ItemOutcome::Merged => report.merged += 1,
                ItemOutcome::Skipped(reason) => {
                    report.skipped += 1;
                    debug!(title = %descriptor.title, %reason, "import item skipped");
                    report
                        .errors
                        .push(format!("{:?}: {}", descriptor.title, reason));
                }
            }
        }
        report.message = format!(
            "Imported {} new books, merged {} existing, skipped {}",
            report.imported, report.merged, report.skipped
        );
        info!(
            imported = report.imported,
            merged = report.merged,
            skipped = report.skipped,
            total = report.total,
            "import batch reconciled"
        );
        report
    }

    fn reconcile_one(&self, descriptor: &BookDescriptor) -> ItemOutcome {
        let isbn = match Isbn::parse(&descriptor.isbn) {
            Ok(isbn) => isbn,
            Err(e) => return ItemOutcome::Skipped(e.to_string()),
        };
        if descriptor.title.trim().is_empty() {
            return ItemOutcome::Skipped("missing required field: title".to_string());
        }
        if descriptor.authors.trim().is_empty() {
            return ItemOutcome::Skipped("missing required field: authors".to_string());
        }

        // Two attempts: losing a create race to a concurrent import of the
        // same ISBN converts the second pass into a merge, and a record
        // deleted mid-batch converts a merge into a create.
        for _ in 0..2 {
            if let Some(existing) = self.catalog.find_by_isbn(&isbn) {
                match self.catalog.adjust_stock(existing.id, 1) {
                    Ok(_) => return ItemOutcome::Merged,
                    Err(Error::BookNotFound(_)) => continue,
                    Err(e) => return ItemOutcome::Skipped(e.to_string()),
                }
            } else {
                let new = NewBook {
                    title: truncated(descriptor.title.trim(), MAX_TITLE_LEN),
                    author: truncated(descriptor.authors.trim(), MAX_AUTHORS_LEN),
                    isbn: isbn.clone(),
                    publisher: descriptor
                        .publisher
                        .as_deref()
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(|p| truncated(p, MAX_PUBLISHER_LEN)),
                    stock: 1,
                };
                match self.catalog.create(new) {
                    Ok(_) => return ItemOutcome::Imported,
                    Err(Error::DuplicateIsbn(_)) => continue,
                    Err(e) => return ItemOutcome::Skipped(e.to_string()),
                }
            }
        }
        ItemOutcome::Skipped(format!("contention reconciling ISBN {isbn}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(title: &str, isbn: &str) -> BookDescriptor {
        BookDescriptor {
            title: title.to_string(),
            authors: "Some Author".to_string(),
            isbn: isbn.to_string(),
            publisher: Some("Some House".to_string()),
        }
    }

    // ========== Basic reconciliation ==========

    #[test]
    fn test_import_new_isbn_creates_with_stock_one() {
        let library = Library::ephemeral();
        let report = library.import_batch(vec![descriptor("Dune", "1111111111111")]);
        assert_eq!(report.imported, 1);
        assert_eq!(report.merged, 0);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.total, 1);

        let book = library
            .catalog()
            .find_by_isbn(&Isbn::parse("1111111111111").unwrap())
            .unwrap();
        assert_eq!(book.stock, 1);
        assert_eq!(book.publisher.as_deref(), Some("Some House"));
    }

    #[test]
    fn test_import_known_isbn_merges_stock() {
        let library = Library::ephemeral();
        library.import_batch(vec![descriptor("Dune", "1111111111111")]);
        let report = library.import_batch(vec![
            descriptor("Dune", "1111111111111"),
            descriptor("Hyperion", "2222222222222"),
        ]);
        assert_eq!(report.merged, 1);
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 0);

        let book = library
            .catalog()
            .find_by_isbn(&Isbn::parse("1111111111111").unwrap())
            .unwrap();
        assert_eq!(book.stock, 2);
        // no duplicate record appeared
        assert_eq!(library.list_books().len(), 2);
    }

    #[test]
    fn test_reimport_is_idempotent_on_records() {
        let library = Library::ephemeral();
        let batch = vec![
            descriptor("Dune", "1111111111111"),
            descriptor("Hyperion", "2222222222222"),
        ];
        let first = library.import_batch(batch.clone());
        assert_eq!((first.imported, first.merged), (2, 0));

        let second = library.import_batch(batch);
        assert_eq!((second.imported, second.merged), (0, 2));
        assert_eq!(library.list_books().len(), 2);
    }

    #[test]
    fn test_empty_batch_is_success() {
        let library = Library::ephemeral();
        let report = library.import_batch(Vec::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.imported, 0);
        assert!(report.errors.is_empty());
    }

    // ========== Validation ==========

    #[test]
    fn test_invalid_isbn_is_skipped_not_fatal() {
        let library = Library::ephemeral();
        let report = library.import_batch(vec![
            descriptor("Bad", "12ab"),
            descriptor("Good", "1111111111111"),
        ]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Bad"));
    }

    #[test]
    fn test_blank_title_and_authors_skipped() {
        let library = Library::ephemeral();
        let mut no_authors = descriptor("Dune", "2222222222222");
        no_authors.authors = "  ".to_string();
        let report = library.import_batch(vec![
            descriptor("   ", "1111111111111"),
            no_authors,
        ]);
        assert_eq!(report.skipped, 2);
        assert!(library.list_books().is_empty());
    }

    #[test]
    fn test_long_fields_are_truncated() {
        let library = Library::ephemeral();
        let mut long = descriptor(&"x".repeat(300), "1111111111111");
        long.authors = "y".repeat(600);
        let report = library.import_batch(vec![long]);
        assert_eq!(report.imported, 1);

        let book = &library.list_books()[0];
        assert_eq!(book.title.chars().count(), 200);
        assert_eq!(book.author.chars().count(), 500);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncated("héllo", 2), "hé");
        assert_eq!(truncated("short", 200), "short");
    }

    // ========== Reporting ==========

    #[test]
    fn test_summary_message_counts() {
        let library = Library::ephemeral();
        library.import_batch(vec![descriptor("Dune", "1111111111111")]);
        let report = library.import_batch(vec![
            descriptor("Dune", "1111111111111"),
            descriptor("Hyperion", "2222222222222"),
            descriptor("Broken", "nope"),
        ]);
        assert_eq!(
            report.message,
            "Imported 1 new books, merged 1 existing, skipped 1"
        );
    }

    #[test]
    fn test_report_serializes_without_empty_errors() {
        let library = Library::ephemeral();
        let report = library.import_batch(vec![descriptor("Dune", "1111111111111")]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["imported"], 1);
    }
}
