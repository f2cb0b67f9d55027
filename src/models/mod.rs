pub mod catalog;
pub mod rating;
pub mod recommendation;

pub use catalog::{Catalog, CatalogItem, ItemId, UserId, GENRE_NAMES};
pub use rating::Rating;
pub use recommendation::{
    Method, PopularItem, Recommendation, RecommendationSet, SeedResolution, TitleMatch,
};
