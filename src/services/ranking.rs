//! Candidate generation and final ranking shared by the similarity strategies.

use std::collections::{HashMap, HashSet};

use ndarray::ArrayView1;

use crate::models::{Catalog, ItemId, Rating, Recommendation};

/// Weight of the popularity tie-break added to a candidate's similarity
pub const POPULARITY_WEIGHT: f64 = 0.05;

/// Rating count per catalog item divided by the largest count.
///
/// Aligned to catalog order. Ratings for ids outside the catalog are ignored;
/// with no ratings at all every entry is zero.
pub fn popularity_scaled(catalog: &Catalog, ratings: &[Rating]) -> Vec<f64> {
    let mut counts = vec![0usize; catalog.len()];
    for rating in ratings {
        if let Some(i) = catalog.index_of(rating.item_id) {
            counts[i] += 1;
        }
    }

    let max = counts.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return vec![0.0; counts.len()];
    }
    counts.into_iter().map(|c| c as f64 / max as f64).collect()
}

/// Indices of the `k` largest values, in no particular order.
///
/// Values tied at the cut-off are taken in ascending index order, so the
/// selected set is deterministic. Callers must sort the final ranking
/// themselves.
pub fn top_k_unordered<T: Copy + Into<f64>>(values: ArrayView1<'_, T>, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    if k == 0 {
        return Vec::new();
    }
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |&a, &b| {
            let (va, vb): (f64, f64) = (values[a].into(), values[b].into());
            vb.total_cmp(&va).then_with(|| a.cmp(&b))
        });
        indices.truncate(k);
    }
    indices
}

/// Best similarity observed per candidate across all seeds
#[derive(Debug, Default)]
pub struct CandidatePool {
    best: HashMap<usize, f64>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a candidate, keeping the maximum similarity seen so far
    pub fn offer(&mut self, index: usize, similarity: f64) {
        self.best
            .entry(index)
            .and_modify(|existing| {
                if similarity > *existing {
                    *existing = similarity;
                }
            })
            .or_insert(similarity);
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    /// Orders candidates by `similarity + POPULARITY_WEIGHT * popularity`.
    ///
    /// Remaining ties fall back to raw similarity, then ascending item id, so
    /// the output is fully deterministic.
    pub fn rank<F>(
        self,
        catalog: &Catalog,
        popularity: &[f64],
        n: usize,
        explain: F,
    ) -> Vec<Recommendation>
    where
        F: Fn(f64) -> String,
    {
        let items = catalog.items();
        let mut scored: Vec<(f64, f64, usize)> = self
            .best
            .into_iter()
            .map(|(index, similarity)| {
                let pop = popularity.get(index).copied().unwrap_or(0.0);
                (similarity + POPULARITY_WEIGHT * pop, similarity, index)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| items[a.2].item_id.cmp(&items[b.2].item_id))
        });
        scored.truncate(n);

        scored
            .into_iter()
            .map(|(score, similarity, index)| Recommendation {
                item_id: items[index].item_id,
                title: items[index].title.clone(),
                score,
                rating_count: None,
                explanation: explain(similarity),
            })
            .collect()
    }
}

/// Valid seed rows plus the widened exclusion set (excludes ∪ seeds)
pub fn prepare_seeds(
    catalog: &Catalog,
    seed_ids: &[ItemId],
    exclude: &HashSet<ItemId>,
) -> (Vec<usize>, HashSet<ItemId>) {
    let mut excluded = exclude.clone();
    excluded.extend(seed_ids.iter().copied());

    let mut seen = HashSet::new();
    let seeds = seed_ids
        .iter()
        .filter_map(|id| catalog.index_of(*id))
        .filter(|i| seen.insert(*i))
        .collect();

    (seeds, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogItem;
    use ndarray::aview1;

    fn create_test_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new(30, "C", vec![1.0]),
            CatalogItem::new(10, "A", vec![1.0]),
            CatalogItem::new(20, "B", vec![1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_popularity_scaled_by_max() {
        let catalog = create_test_catalog();
        let ratings = vec![
            Rating::new(1, 10, 4.0, 0),
            Rating::new(2, 10, 3.0, 0),
            Rating::new(1, 20, 5.0, 0),
            Rating::new(1, 99, 5.0, 0),
        ];
        assert_eq!(popularity_scaled(&catalog, &ratings), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_popularity_without_ratings_is_zero() {
        let catalog = create_test_catalog();
        assert_eq!(popularity_scaled(&catalog, &[]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_top_k_unordered_selects_largest() {
        let values = [0.1f64, 0.9, 0.5, 0.7, 0.2];
        let mut top = top_k_unordered(aview1(&values), 3);
        top.sort_unstable();
        assert_eq!(top, vec![1, 2, 3]);

        assert_eq!(top_k_unordered(aview1(&values), 0), Vec::<usize>::new());
        assert_eq!(top_k_unordered(aview1(&values), 10).len(), 5);
    }

    #[test]
    fn test_top_k_unordered_ties_at_cutoff_prefer_lower_index() {
        let values = [0.5f32, 0.9, 0.5, 0.5, 0.5, 0.1];
        for k in 2..=4 {
            let mut top = top_k_unordered(aview1(&values), k);
            top.sort_unstable();
            let mut expected = vec![1];
            expected.extend([0, 2, 3].into_iter().take(k - 1));
            expected.sort_unstable();
            assert_eq!(top, expected, "k = {k}");
        }
    }

    #[test]
    fn test_pool_keeps_max_similarity() {
        let mut pool = CandidatePool::new();
        pool.offer(0, 0.3);
        pool.offer(0, 0.8);
        pool.offer(0, 0.5);
        assert_eq!(pool.len(), 1);

        let catalog = create_test_catalog();
        let ranked = pool.rank(&catalog, &[0.0, 0.0, 0.0], 10, |s| format!("{s:.2}"));
        assert_eq!(ranked[0].score, 0.8);
        assert_eq!(ranked[0].explanation, "0.80");
    }

    #[test]
    fn test_rank_breaks_ties_by_item_id() {
        let catalog = create_test_catalog();
        let mut pool = CandidatePool::new();
        pool.offer(0, 0.5); // id 30
        pool.offer(1, 0.5); // id 10
        pool.offer(2, 0.5); // id 20

        let ranked = pool.rank(&catalog, &[0.0, 0.0, 0.0], 10, |_| String::new());
        let ids: Vec<ItemId> = ranked.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_rank_popularity_only_breaks_near_ties() {
        let catalog = create_test_catalog();
        let mut pool = CandidatePool::new();
        pool.offer(0, 0.90); // id 30, unpopular
        pool.offer(1, 0.80); // id 10, most popular
        pool.offer(2, 0.89); // id 20, popular

        let ranked = pool.rank(&catalog, &[0.0, 1.0, 1.0], 2, |_| String::new());
        let ids: Vec<ItemId> = ranked.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![20, 30]);
    }

    #[test]
    fn test_prepare_seeds_widens_exclusions() {
        let catalog = create_test_catalog();
        let exclude: HashSet<ItemId> = [20].into_iter().collect();
        let (seeds, excluded) = prepare_seeds(&catalog, &[10, 10, 404], &exclude);

        assert_eq!(seeds, vec![1]);
        assert!(excluded.contains(&10));
        assert!(excluded.contains(&20));
        assert!(excluded.contains(&404));
    }
}
