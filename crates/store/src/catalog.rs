//! Catalog store: Book records keyed by id, with an ISBN index
//!
//! ## Design
//!
//! Two sharded maps: the primary `BookId → Book` map and a secondary
//! `Isbn → BookId` index used for dedup lookups. Reads are lock-free;
//! writes lock only the target record's shard.
//!
//! Operations that touch both maps (create, ISBN-changing update, remove)
//! serialize through a store-level maintenance mutex so their two map
//! accesses cannot interleave with each other. `adjust_stock` stays off
//! that mutex: it is the hot path and touches the primary map only.
//!
//! ## Stock
//!
//! `adjust_stock` is the only stock mutator. `adjust_stock_and` additionally
//! runs a caller closure while the record guard is still held and applies
//! the adjustment only if the closure succeeds; the engine uses it to make
//! "stock change + ledger write" a single atomic unit.

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use circ_core::{Book, BookId, BookPatch, Error, Isbn, NewBook, Result};

/// Keyed storage for Book records with ISBN-uniqueness enforcement
#[derive(Debug, Default)]
pub struct CatalogStore {
    books: DashMap<BookId, Book>,
    by_isbn: DashMap<Isbn, BookId>,
    /// Serializes create/update/remove, which touch both maps
    maintenance: Mutex<()>,
}

impl CatalogStore {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a catalog from snapshot records
    ///
    /// # Errors
    /// Returns `Error::DuplicateIsbn` if two records share an ISBN.
    pub fn from_records(records: Vec<Book>) -> Result<Self> {
        let store = Self::new();
        for book in records {
            if store.by_isbn.contains_key(&book.isbn) {
                return Err(Error::DuplicateIsbn(book.isbn));
            }
            store.by_isbn.insert(book.isbn.clone(), book.id);
            store.books.insert(book.id, book);
        }
        Ok(store)
    }

    /// Clone out all records, for snapshots
    pub fn snapshot(&self) -> Vec<Book> {
        self.books.iter().map(|r| r.value().clone()).collect()
    }

    /// Create a new book record
    ///
    /// # Errors
    /// - `Error::MissingField` for a blank title or author
    /// - `Error::DuplicateIsbn` if the ISBN is already cataloged
    pub fn create(&self, new: NewBook) -> Result<Book> {
        new.validate()?;
        let _guard = self.maintenance.lock();
        if self.by_isbn.contains_key(&new.isbn) {
            return Err(Error::DuplicateIsbn(new.isbn));
        }
        let book = Book {
            id: BookId::new(),
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            publisher: new.publisher,
            stock: new.stock,
        };
        self.books.insert(book.id, book.clone());
        self.by_isbn.insert(book.isbn.clone(), book.id);
        debug!(book_id = %book.id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    /// Fetch a book by id
    pub fn get(&self, id: BookId) -> Result<Book> {
        self.books
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(Error::BookNotFound(id))
    }

    /// All books, in no particular order
    pub fn list(&self) -> Vec<Book> {
        self.books.iter().map(|r| r.value().clone()).collect()
    }

    /// Look up a book by ISBN
    pub fn find_by_isbn(&self, isbn: &Isbn) -> Option<Book> {
        let id = *self.by_isbn.get(isbn)?;
        self.books.get(&id).map(|r| r.value().clone())
    }

    /// Apply a partial update
    ///
    /// Changing the ISBN re-checks uniqueness and keeps the index
    /// consistent.
    pub fn update(&self, id: BookId, patch: BookPatch) -> Result<Book> {
        patch.validate()?;
        let _guard = self.maintenance.lock();
        if let Some(new_isbn) = &patch.isbn {
            if let Some(existing) = self.by_isbn.get(new_isbn) {
                if *existing != id {
                    return Err(Error::DuplicateIsbn(new_isbn.clone()));
                }
            }
        }
        let mut entry = self.books.get_mut(&id).ok_or(Error::BookNotFound(id))?;
        let old_isbn = entry.isbn.clone();
        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(author) = patch.author {
            entry.author = author;
        }
        if let Some(isbn) = patch.isbn {
            entry.isbn = isbn;
        }
        if let Some(publisher) = patch.publisher {
            entry.publisher = Some(publisher);
        }
        if let Some(stock) = patch.stock {
            entry.stock = stock;
        }
        if entry.isbn != old_isbn {
            self.by_isbn.remove(&old_isbn);
            self.by_isbn.insert(entry.isbn.clone(), id);
        }
        Ok(entry.clone())
    }

    /// Remove a book record
    pub fn remove(&self, id: BookId) -> Result<Book> {
        self.remove_if(id, |_| Ok(()))
    }

    /// Remove a book record if `predicate` allows it
    ///
    /// The predicate runs under the record's exclusive guard, so its
    /// decision cannot race a concurrent writer of the same record: an
    /// issue holding the guard finishes before the predicate sees the
    /// book, and a removal wins before the issue re-reads it.
    pub fn remove_if(&self, id: BookId, predicate: impl FnOnce(&Book) -> Result<()>) -> Result<Book> {
        let _guard = self.maintenance.lock();
        let mut refusal = None;
        let removed = self.books.remove_if(&id, |_, book| match predicate(book) {
            Ok(()) => true,
            Err(e) => {
                refusal = Some(e);
                false
            }
        });
        if let Some(e) = refusal {
            return Err(e);
        }
        let (_, book) = removed.ok_or(Error::BookNotFound(id))?;
        self.by_isbn.remove(&book.isbn);
        debug!(book_id = %book.id, "book removed");
        Ok(book)
    }

    /// Adjust the stock count by a signed delta, atomically
    ///
    /// # Errors
    /// - `Error::BookNotFound` for an unknown id
    /// - `Error::StockWouldGoNegative` if the delta underflows; nothing is
    ///   applied in that case
    pub fn adjust_stock(&self, id: BookId, delta: i64) -> Result<Book> {
        self.adjust_stock_and(id, delta, |_| Ok(()))
            .map(|(book, ())| book)
    }

    /// Adjust stock and run `f` under the same record guard
    ///
    /// The closure sees the record as it was before the adjustment; the
    /// delta is applied only after `f` returns Ok. Concurrent callers on
    /// the same record serialize on the guard, so a losing racer on the
    /// last copy observes the underflow and fails cleanly.
    pub fn adjust_stock_and<T>(
        &self,
        id: BookId,
        delta: i64,
        f: impl FnOnce(&Book) -> Result<T>,
    ) -> Result<(Book, T)> {
        let mut entry = self.books.get_mut(&id).ok_or(Error::BookNotFound(id))?;
        let next = i64::from(entry.stock) + delta;
        if next < 0 {
            return Err(Error::StockWouldGoNegative {
                book_id: id,
                stock: entry.stock,
            });
        }
        debug_assert!(next <= i64::from(u32::MAX));
        let out = f(&entry)?;
        entry.stock = next as u32;
        debug!(book_id = %id, delta, stock = entry.stock, "stock adjusted");
        Ok((entry.clone(), out))
    }

    /// Number of cataloged books
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
