//! Identifier and ISBN types for the circulation system
//!
//! This module defines the foundational types:
//! - BookId / MemberId / LoanId: unique record identifiers
//! - Isbn: validated 13-digit book number used for catalog dedup

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for a catalog Book record
///
/// A BookId is a wrapper around a UUID v4. Identifiers are server-assigned
/// at creation time and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

/// Unique identifier for a Member record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(Uuid);

/// Unique identifier for a Loan record in the transaction ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            /// Create a new random identifier using UUID v4
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from a string representation
            ///
            /// Accepts standard UUID format (with or without hyphens).
            /// Returns None if the string is not a valid UUID.
            pub fn from_string(s: &str) -> Option<Self> {
                Uuid::parse_str(s).ok().map(Self)
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(BookId);
impl_id!(MemberId);
impl_id!(LoanId);

/// Validated ISBN: exactly 13 ASCII digits
///
/// The catalog deduplicates imported records by ISBN, so the format is
/// enforced at the type boundary: an `Isbn` value is always well-formed.
/// Surrounding whitespace is trimmed before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// Required number of digits
    pub const LEN: usize = 13;

    /// Parse and validate an ISBN string
    ///
    /// # Errors
    /// Returns `Error::InvalidIsbn` unless the trimmed input is exactly
    /// 13 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidIsbn(s.to_string()))
        }
    }

    /// The digits as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isbn {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}
