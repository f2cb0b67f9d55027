use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::ItemId;

/// Configuration errors raised while building or fitting a model.
///
/// These are fatal: they surface once at construction time and are never
/// produced by a per-request call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Duplicate catalog item id: {0}")]
    DuplicateItem(ItemId),

    #[error("Item {item_id} has {found} genre flags, expected {expected}")]
    GenreWidth {
        item_id: ItemId,
        expected: usize,
        found: usize,
    },

    #[error("Item {item_id} has a negative or non-finite genre flag at column {column}")]
    InvalidGenre { item_id: ItemId, column: usize },

    #[error("Catalog is missing genre columns")]
    MissingGenres,

    #[error("Catalog has {items} items, collaborative filtering is limited to {limit}")]
    CatalogTooLarge { items: usize, limit: usize },
}

/// Errors raised while reading dataset files
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("Expected folder not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{file} line {line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        file: &'static str,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{file} line {line}: invalid {field} value {value:?}")]
    InvalidField {
        file: &'static str,
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("Invalid catalog: {0}")]
    Catalog(#[from] ModelError),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Model(_) | AppError::Dataset(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
