use serde::{Deserialize, Serialize};

use super::{ItemId, UserId};

/// One explicit rating from the rating history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl Rating {
    pub fn new(user_id: UserId, item_id: ItemId, rating: f64, timestamp: i64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp,
        }
    }
}
