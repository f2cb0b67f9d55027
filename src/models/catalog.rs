use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ModelError;

/// Identifier of a catalog item (MovieLens `movie_id`)
pub type ItemId = u32;

/// Identifier of a rating user (MovieLens `user_id`)
pub type UserId = u32;

/// Genre columns of the MovieLens 100k item table, in file order
pub const GENRE_NAMES: [&str; 19] = [
    "unknown",
    "Action",
    "Adventure",
    "Animation",
    "Children",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

/// A single movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub title: String,
    /// Finite, non-negative genre flags, one per genre column
    pub genres: Vec<f64>,
}

impl CatalogItem {
    pub fn new(item_id: ItemId, title: impl Into<String>, genres: Vec<f64>) -> Self {
        Self {
            item_id,
            title: title.into(),
            genres,
        }
    }
}

/// A validated, immutable catalog snapshot.
///
/// Items keep their input order; that order is the "catalog iteration order"
/// used for stable tie-breaking and for the row order of derived matrices.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<ItemId, usize>,
    genre_width: usize,
}

impl Catalog {
    /// Builds a catalog, checking id uniqueness, a constant genre width and
    /// finite, non-negative genre flags
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, ModelError> {
        let genre_width = items.first().map(|item| item.genres.len()).unwrap_or(0);
        let mut index = HashMap::with_capacity(items.len());

        for (position, item) in items.iter().enumerate() {
            if index.insert(item.item_id, position).is_some() {
                return Err(ModelError::DuplicateItem(item.item_id));
            }
            if item.genres.len() != genre_width {
                return Err(ModelError::GenreWidth {
                    item_id: item.item_id,
                    expected: genre_width,
                    found: item.genres.len(),
                });
            }
            if let Some(column) = item
                .genres
                .iter()
                .position(|flag| !flag.is_finite() || *flag < 0.0)
            {
                return Err(ModelError::InvalidGenre {
                    item_id: item.item_id,
                    column,
                });
            }
        }

        Ok(Self {
            items,
            index,
            genre_width,
        })
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of genre flags carried by every item
    pub fn genre_width(&self) -> usize {
        self.genre_width
    }

    /// Row position of an item id
    pub fn index_of(&self, item_id: ItemId) -> Option<usize> {
        self.index.get(&item_id).copied()
    }

    pub fn get(&self, item_id: ItemId) -> Option<&CatalogItem> {
        self.index_of(item_id).map(|i| &self.items[i])
    }

    pub fn title(&self, item_id: ItemId) -> Option<&str> {
        self.get(item_id).map(|item| item.title.as_str())
    }
}
