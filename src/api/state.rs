use std::sync::Arc;

use crate::services::Recommender;

/// Shared application state.
///
/// The recommender is fitted before the server starts and never mutated, so
/// handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

impl AppState {
    /// Wraps a fully built recommender
    pub fn new(recommender: Recommender) -> Self {
        Self {
            recommender: Arc::new(recommender),
        }
    }
}
