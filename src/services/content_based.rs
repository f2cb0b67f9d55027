use std::collections::HashSet;
use std::sync::Arc;

use ndarray::{Array1, Array2};

use crate::{
    error::ModelError,
    models::{Catalog, ItemId, Rating, Recommendation},
    services::ranking::{popularity_scaled, prepare_seeds, top_k_unordered, CandidatePool},
};

/// Content-based recommender using genre cosine similarity.
///
/// Holds one unit-normalized genre row per catalog item plus the popularity
/// tie-break vector. Built once per catalog snapshot and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ContentSimilarityEngine {
    catalog: Arc<Catalog>,
    /// `len x width`, rows are unit (or zero) genre vectors in catalog order
    genres: Array2<f64>,
    popularity: Vec<f64>,
}

impl ContentSimilarityEngine {
    /// Builds the normalized genre matrix for a catalog snapshot
    pub fn new(catalog: impl Into<Arc<Catalog>>, ratings: &[Rating]) -> Result<Self, ModelError> {
        let catalog = catalog.into();
        let width = catalog.genre_width();
        if width == 0 && !catalog.is_empty() {
            return Err(ModelError::MissingGenres);
        }

        let items = catalog.items();
        let mut genres = Array2::from_shape_fn((items.len(), width), |(i, j)| items[i].genres[j]);
        for mut row in genres.rows_mut() {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|g| g / norm);
            }
        }

        let popularity = popularity_scaled(&catalog, ratings);
        Ok(Self {
            catalog,
            genres,
            popularity,
        })
    }

    /// Cosine similarity between two items' genre vectors.
    ///
    /// `None` if either id is not in the catalog.
    pub fn similarity(&self, a: ItemId, b: ItemId) -> Option<f64> {
        let a = self.catalog.index_of(a)?;
        let b = self.catalog.index_of(b)?;
        Some(self.genres.row(a).dot(&self.genres.row(b)))
    }

    /// Cosine similarity from one item row to every catalog item
    fn similarities_to(&self, seed: usize) -> Array1<f64> {
        self.genres.dot(&self.genres.row(seed))
    }

    /// Recommends items with genres similar to the seeds.
    ///
    /// Each seed nominates its `per_seed_k` most similar items; a candidate
    /// nominated by several seeds keeps its best similarity. Seeds and
    /// `exclude` never appear in the output. Unknown seeds are ignored.
    pub fn recommend(
        &self,
        seed_ids: &[ItemId],
        n: usize,
        per_seed_k: usize,
        exclude: &HashSet<ItemId>,
    ) -> Vec<Recommendation> {
        let (seeds, excluded) = prepare_seeds(&self.catalog, seed_ids, exclude);
        if seeds.is_empty() {
            tracing::debug!(seeds = seed_ids.len(), "No content seeds found in catalog");
            return Vec::new();
        }

        let items = self.catalog.items();
        let mut pool = CandidatePool::new();
        for seed in seeds {
            let sims = self.similarities_to(seed);
            for j in top_k_unordered(sims.view(), per_seed_k) {
                if excluded.contains(&items[j].item_id) {
                    continue;
                }
                pool.offer(j, sims[j]);
            }
        }

        tracing::debug!(candidates = pool.len(), "Content candidates generated");

        pool.rank(&self.catalog, &self.popularity, n, |sim| {
            format!("Similar genres to your picks (genre cosine sim={sim:.2}).")
        })
    }
}

/// Builds a content engine over the snapshot and queries it once
pub fn recommend_by_genre_similarity(
    catalog: &Catalog,
    ratings: &[Rating],
    seed_ids: &[ItemId],
    n: usize,
    per_seed_k: usize,
    exclude: &HashSet<ItemId>,
) -> Result<Vec<Recommendation>, ModelError> {
    let engine = ContentSimilarityEngine::new(catalog.clone(), ratings)?;
    Ok(engine.recommend(seed_ids, n, per_seed_k, exclude))
}
