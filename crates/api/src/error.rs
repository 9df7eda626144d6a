//! Error shape crossing the API boundary

use serde::Serialize;
use thiserror::Error;

use circ_core::{Error as CoreError, ErrorKind};

/// A failure rendered for the caller
///
/// `kind` is the machine-readable class (`validation`, `not_found`,
/// `conflict`, `business_rule`, `transient`); `error` is the
/// human-readable message, which for business-rule refusals carries the
/// current stock or debt context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{error}")]
pub struct ApiError {
    /// Error class for rendering decisions
    pub kind: ErrorKind,
    /// Human-readable message
    pub error: String,
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self {
            kind: e.kind(),
            error: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circ_core::BookId;

    #[test]
    fn test_kind_and_message_carried() {
        let api: ApiError = CoreError::OutOfStock {
            book_id: BookId::new(),
            stock: 0,
        }
        .into();
        assert_eq!(api.kind, ErrorKind::BusinessRule);
        assert!(api.error.contains("out of stock"));
    }

    #[test]
    fn test_serialized_shape() {
        let api: ApiError = CoreError::MissingField("title").into();
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["error"], "missing required field: title");
    }
}
