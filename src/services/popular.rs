use std::collections::{HashMap, HashSet};

use crate::models::{Catalog, ItemId, PopularItem, Rating};

const EXPLANATION: &str = "Popular baseline: high average rating with enough ratings.";

/// Running (count, sum) for one item
#[derive(Debug, Default, Clone, Copy)]
struct RatingStats {
    count: usize,
    sum: f64,
}

impl RatingStats {
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Popular baseline: ranks items by mean rating among those with at least
/// `min_count` ratings.
///
/// Ties on the mean are broken by rating count (descending), then by item id
/// (ascending). Seeds play no part; callers pass them through `exclude` if they
/// should not be returned. Items rated but missing from the catalog are titled
/// `"Unknown"`.
pub fn rank(
    ratings: &[Rating],
    catalog: &Catalog,
    n: usize,
    exclude: &HashSet<ItemId>,
    min_count: usize,
) -> Vec<PopularItem> {
    let mut stats: HashMap<ItemId, RatingStats> = HashMap::new();
    for rating in ratings {
        let entry = stats.entry(rating.item_id).or_default();
        entry.count += 1;
        entry.sum += rating.rating;
    }

    let mut ranked: Vec<(ItemId, RatingStats)> = stats
        .into_iter()
        .filter(|(id, s)| s.count >= min_count && !exclude.contains(id))
        .collect();

    ranked.sort_by(|(a_id, a), (b_id, b)| {
        b.mean()
            .total_cmp(&a.mean())
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a_id.cmp(b_id))
    });
    ranked.truncate(n);

    tracing::debug!(
        returned = ranked.len(),
        min_count,
        "Ranked popular items"
    );

    ranked
        .into_iter()
        .map(|(item_id, s)| PopularItem {
            item_id,
            title: catalog.title(item_id).unwrap_or("Unknown").to_string(),
            score: s.mean(),
            rating_count: s.count,
            explanation: EXPLANATION.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogItem;

    fn create_test_data() -> (Catalog, Vec<Rating>) {
        let catalog = Catalog::new(vec![
            CatalogItem::new(1, "A", vec![1.0]),
            CatalogItem::new(2, "B", vec![1.0]),
            CatalogItem::new(3, "C", vec![1.0]),
        ])
        .unwrap();
        let ratings = vec![
            Rating::new(1, 1, 5.0, 0),
            Rating::new(1, 2, 1.0, 0),
            Rating::new(2, 1, 4.0, 0),
            Rating::new(2, 3, 5.0, 0),
        ];
        (catalog, ratings)
    }

    #[test]
    fn test_rank_orders_by_mean_then_count() {
        let (catalog, ratings) = create_test_data();
        let ranked = rank(&ratings, &catalog, 10, &HashSet::new(), 1);

        let ids: Vec<ItemId> = ranked.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(ranked[0].score, 5.0);
        assert_eq!(ranked[1].score, 4.5);
        assert_eq!(ranked[1].rating_count, 2);
        assert_eq!(ranked[2].title, "B");
    }

    #[test]
    fn test_rank_min_count_filters() {
        let (catalog, ratings) = create_test_data();
        let ranked = rank(&ratings, &catalog, 10, &HashSet::new(), 2);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item_id, 1);
        assert!(ranked.iter().all(|r| r.rating_count >= 2));
    }

    #[test]
    fn test_rank_excludes_ids() {
        let (catalog, ratings) = create_test_data();
        let exclude: HashSet<ItemId> = [3].into_iter().collect();
        let ranked = rank(&ratings, &catalog, 10, &exclude, 1);

        assert!(ranked.iter().all(|r| r.item_id != 3));
        assert_eq!(ranked[0].item_id, 1);
    }

    #[test]
    fn test_rank_equal_means_prefer_more_ratings() {
        let catalog = Catalog::new(Vec::new()).unwrap();
        let ratings = vec![
            Rating::new(1, 8, 4.0, 0),
            Rating::new(1, 9, 4.0, 0),
            Rating::new(2, 9, 4.0, 0),
        ];
        let ranked = rank(&ratings, &catalog, 10, &HashSet::new(), 1);

        assert_eq!(ranked[0].item_id, 9);
        assert_eq!(ranked[1].item_id, 8);
        assert_eq!(ranked[0].title, "Unknown");
    }

    #[test]
    fn test_rank_truncates_and_handles_no_qualifiers() {
        let (catalog, ratings) = create_test_data();
        assert_eq!(rank(&ratings, &catalog, 1, &HashSet::new(), 1).len(), 1);
        assert!(rank(&ratings, &catalog, 10, &HashSet::new(), 50).is_empty());
        assert!(rank(&[], &catalog, 10, &HashSet::new(), 0).is_empty());
    }
}
