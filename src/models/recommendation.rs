use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::ItemId;

/// A catalog title matched by a free-text query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleMatch {
    pub item_id: ItemId,
    pub title: String,
    pub score: f64,
}

/// An item ranked by the popularity baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularItem {
    pub item_id: ItemId,
    pub title: String,
    /// Mean rating
    pub score: f64,
    pub rating_count: usize,
    pub explanation: String,
}

/// A ranked, explained recommendation returned to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<usize>,
    pub explanation: String,
}

impl From<PopularItem> for Recommendation {
    fn from(item: PopularItem) -> Self {
        Self {
            item_id: item.item_id,
            title: item.title,
            score: item.score,
            rating_count: Some(item.rating_count),
            explanation: item.explanation,
        }
    }
}

/// Ranking strategy selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Popular,
    Content,
    #[default]
    ItemCf,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Popular => write!(f, "popular"),
            Method::Content => write!(f, "content"),
            Method::ItemCf => write!(f, "item_cf"),
        }
    }
}

/// Outcome of resolving free-text seeds against the catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedResolution {
    pub resolved: Vec<TitleMatch>,
    pub unresolved: Vec<String>,
}

impl SeedResolution {
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.resolved.iter().map(|m| m.item_id).collect()
    }
}

/// Full response of one recommendation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSet {
    pub method: Method,
    pub seeds: Vec<TitleMatch>,
    pub unresolved: Vec<String>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serde() {
        assert_eq!(serde_json::to_string(&Method::ItemCf).unwrap(), "\"item_cf\"");
        let method: Method = serde_json::from_str("\"content\"").unwrap();
        assert_eq!(method, Method::Content);
        assert_eq!(Method::default(), Method::ItemCf);
        assert_eq!(Method::Popular.to_string(), "popular");
    }

    #[test]
    fn test_popular_item_into_recommendation_keeps_count() {
        let item = PopularItem {
            item_id: 50,
            title: "Star Wars (1977)".to_string(),
            score: 4.36,
            rating_count: 583,
            explanation: "popular".to_string(),
        };
        let rec: Recommendation = item.into();
        assert_eq!(rec.rating_count, Some(583));

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["rating_count"], 583);
    }

    #[test]
    fn test_similarity_recommendation_omits_count() {
        let rec = Recommendation {
            item_id: 1,
            title: "Toy Story (1995)".to_string(),
            score: 0.9,
            rating_count: None,
            explanation: "similar".to_string(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("rating_count").is_none());
    }
}
