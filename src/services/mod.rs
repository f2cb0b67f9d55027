pub mod content_based;
pub mod item_cf;
pub mod popular;
pub mod ranking;
pub mod recommender;
pub mod title_match;

pub use content_based::{recommend_by_genre_similarity, ContentSimilarityEngine};
pub use item_cf::ItemItemModel;
pub use recommender::{Recommender, RecommenderSettings};
