use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nr_core::{Article, Error, NewsQuery, QueryResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub articles: Option<Vec<Article>>,
    pub query: String,
    pub total_results: usize,
}

impl ApiResponse {
    pub fn rejected(query: String) -> Self {
        Self {
            articles: None,
            query,
            total_results: 0,
        }
    }
}

impl From<QueryResult> for ApiResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            total_results: result.total_results,
            articles: Some(result.articles),
            query: result.query,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NameParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreParams {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

fn default_threshold() -> f64 {
    0.7
}

fn default_radius() -> f64 {
    10.0
}

async fn run(state: &AppState, query: NewsQuery) -> Response {
    let descriptor = query.descriptor();
    match state.service.execute(query, None).await {
        Ok(result) => Json(ApiResponse::from(result)).into_response(),
        Err(Error::InvalidArgument(reason)) => {
            tracing::warn!(query = %descriptor, "Rejected request: {}", reason);
            (StatusCode::BAD_REQUEST, Json(ApiResponse::rejected(descriptor))).into_response()
        }
        Err(e) => {
            tracing::error!(query = %descriptor, "Query failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::rejected(descriptor))).into_response()
        }
    }
}

pub async fn by_category(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Response {
    run(&state, NewsQuery::Category(params.name)).await
}

pub async fn by_score(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoreParams>,
) -> Response {
    run(&state, NewsQuery::Score(params.threshold)).await
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    run(&state, NewsQuery::Search(params.query)).await
}

pub async fn by_source(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NameParams>,
) -> Response {
    run(&state, NewsQuery::Source(params.name)).await
}

pub async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyParams>,
) -> Response {
    let query = NewsQuery::Nearby {
        lat: params.lat,
        lon: params.lon,
        radius_km: params.radius,
    };
    run(&state, query).await
}

pub async fn natural_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    run(&state, NewsQuery::Natural(request.query.unwrap_or_default())).await
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.service.summary_by_id(&id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(Error::NotFound(_)) => (StatusCode::NOT_FOUND, "Article not found").into_response(),
        Err(e) => {
            tracing::error!(article_id = %id, "Summary lookup failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate summary").into_response()
        }
    }
}
