use serde::Deserialize;

use crate::services::RecommenderSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory containing the `ml-100k` dataset folder
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed to call the API from a browser
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Minimum fuzzy score for a query to resolve to a catalog title
    #[serde(default = "default_min_title_score")]
    pub min_title_score: f64,

    /// Candidates taken from each seed before aggregation
    #[serde(default = "default_per_seed_k")]
    pub per_seed_k: usize,

    /// Minimum rating count for the popularity baseline
    #[serde(default = "default_popular_min_ratings")]
    pub popular_min_ratings: usize,

    /// Largest catalog the item-item model will fit (dense I x I matrix)
    #[serde(default = "default_cf_max_items")]
    pub cf_max_items: usize,

    /// Upper bound on results returned per request
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_data_dir() -> String {
    "data/raw".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_min_title_score() -> f64 {
    RecommenderSettings::default().min_title_score
}

fn default_per_seed_k() -> usize {
    RecommenderSettings::default().per_seed_k
}

fn default_popular_min_ratings() -> usize {
    RecommenderSettings::default().popular_min_ratings
}

fn default_cf_max_items() -> usize {
    RecommenderSettings::default().cf_max_items
}

fn default_max_results() -> usize {
    RecommenderSettings::default().max_results
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tuning knobs handed to the recommender
    pub fn settings(&self) -> RecommenderSettings {
        RecommenderSettings {
            min_title_score: self.min_title_score,
            per_seed_k: self.per_seed_k,
            popular_min_ratings: self.popular_min_ratings,
            cf_max_items: self.cf_max_items,
            max_results: self.max_results,
        }
    }
}
