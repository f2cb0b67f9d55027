use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::ModelError,
    models::{
        Catalog, ItemId, Method, Rating, Recommendation, RecommendationSet, SeedResolution,
        TitleMatch,
    },
    services::{content_based::ContentSimilarityEngine, item_cf::ItemItemModel, popular, title_match},
};

/// Tuning knobs for the recommender
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderSettings {
    /// Minimum fuzzy score for a seed query to resolve
    pub min_title_score: f64,
    /// Candidates taken from each seed before aggregation
    pub per_seed_k: usize,
    /// Minimum rating count for the popularity baseline
    pub popular_min_ratings: usize,
    /// Largest catalog the item-item model will fit
    pub cf_max_items: usize,
    /// Upper bound on results per request
    pub max_results: usize,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            min_title_score: 0.6,
            per_seed_k: 200,
            popular_min_ratings: 50,
            cf_max_items: crate::services::item_cf::DEFAULT_MAX_ITEMS,
            max_results: 100,
        }
    }
}

/// Owns the catalog snapshot and every fitted model built from it.
///
/// Construction is the expensive, one-off step; afterwards all methods take
/// `&self` and may run concurrently.
pub struct Recommender {
    catalog: Arc<Catalog>,
    ratings: Vec<Rating>,
    content: ContentSimilarityEngine,
    item_cf: ItemItemModel,
    settings: RecommenderSettings,
}

impl Recommender {
    /// Builds the content engine and fits the item-item model
    pub fn build(
        catalog: Catalog,
        ratings: Vec<Rating>,
        settings: RecommenderSettings,
    ) -> Result<Self, ModelError> {
        let start = Instant::now();
        let catalog = Arc::new(catalog);

        let content = ContentSimilarityEngine::new(Arc::clone(&catalog), &ratings)?;
        let item_cf = ItemItemModel::fit(&ratings, Arc::clone(&catalog), settings.cf_max_items)?;

        tracing::info!(
            items = catalog.len(),
            ratings = ratings.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Recommender ready"
        );

        Ok(Self {
            catalog,
            ratings,
            content,
            item_cf,
            settings,
        })
    }

    /// Fuzzy title search with the configured score threshold
    pub fn search(&self, query: &str, k: usize) -> Vec<TitleMatch> {
        let k = k.min(self.settings.max_results);
        title_match::resolve(&self.catalog, query, k, self.settings.min_title_score)
    }

    /// Resolves each free-text query to its best matching title.
    ///
    /// Blank queries are ignored. A title matched by several queries is kept
    /// once, at its first position.
    pub fn resolve_seeds<S: AsRef<str>>(&self, queries: &[S]) -> SeedResolution {
        let mut resolution = SeedResolution::default();
        let mut seen = HashSet::new();

        for query in queries {
            let query = query.as_ref().trim();
            if query.is_empty() {
                continue;
            }
            match self.search(query, 1).into_iter().next() {
                Some(found) => {
                    if seen.insert(found.item_id) {
                        resolution.resolved.push(found);
                    }
                }
                None => resolution.unresolved.push(query.to_string()),
            }
        }

        resolution
    }

    /// Resolves the seed queries and ranks items with the chosen method.
    ///
    /// `n` is clamped to `1..=max_results`. Resolved seeds are always excluded
    /// from the output, including for the popularity baseline.
    pub fn recommend<S: AsRef<str>>(
        &self,
        queries: &[S],
        method: Method,
        n: usize,
        exclude: &HashSet<ItemId>,
    ) -> RecommendationSet {
        let n = n.clamp(1, self.settings.max_results.max(1));
        let seeds = self.resolve_seeds(queries);
        let seed_ids = seeds.item_ids();

        let recommendations: Vec<Recommendation> = match method {
            Method::Popular => {
                let mut excluded = exclude.clone();
                excluded.extend(seed_ids.iter().copied());
                popular::rank(
                    &self.ratings,
                    &self.catalog,
                    n,
                    &excluded,
                    self.settings.popular_min_ratings,
                )
                .into_iter()
                .map(Recommendation::from)
                .collect()
            }
            Method::Content => {
                self.content
                    .recommend(&seed_ids, n, self.settings.per_seed_k, exclude)
            }
            Method::ItemCf => {
                self.item_cf
                    .recommend(&seed_ids, n, self.settings.per_seed_k, exclude)
            }
        };

        tracing::info!(
            method = %method,
            seeds = seed_ids.len(),
            unresolved = seeds.unresolved.len(),
            returned = recommendations.len(),
            "Recommendations computed"
        );

        RecommendationSet {
            method,
            seeds: seeds.resolved,
            unresolved: seeds.unresolved,
            recommendations,
        }
    }
}
