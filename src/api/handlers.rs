use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, Method, RecommendationSet, TitleMatch},
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_search_k")]
    pub k: usize,
}

fn default_search_k() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Free-text titles used as seeds
    pub movies: Vec<String>,
    #[serde(default = "default_n")]
    pub n: usize,
    #[serde(default)]
    pub method: Method,
    /// Item ids that must not be recommended; ids outside the item id range
    /// are dropped
    #[serde(default)]
    pub exclude: Vec<i64>,
}

fn default_n() -> usize {
    10
}

// Handlers

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Movie Recommender API" }))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Fuzzy title search over the catalog
pub async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<TitleMatch>>> {
    if params.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Query must not be empty".to_string()));
    }

    let matches = state.recommender.search(&params.q, params.k);
    tracing::info!(query = %params.q, matches = matches.len(), "Title search");

    Ok(Json(matches))
}

/// Resolves seed titles and returns ranked recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendationSet>> {
    tracing::info!(
        seeds = request.movies.len(),
        method = %request.method,
        n = request.n,
        "Processing recommendation request"
    );

    let exclude: HashSet<ItemId> = request
        .exclude
        .into_iter()
        .filter_map(|id| ItemId::try_from(id).ok())
        .collect();
    let recommender = state.recommender.clone();

    // Similarity scans are CPU bound; keep them off the async workers
    let response = tokio::task::spawn_blocking(move || {
        recommender.recommend(request.movies.as_slice(), request.method, request.n, &exclude)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(response))
}
