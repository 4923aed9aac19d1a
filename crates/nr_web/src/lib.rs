use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use handlers::ApiResponse;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    let news = Router::new()
        .route("/category", get(handlers::by_category))
        .route("/score", get(handlers::by_score))
        .route("/search", get(handlers::search))
        .route("/source", get(handlers::by_source))
        .route("/nearby", get(handlers::nearby))
        .route("/query", post(handlers::natural_query))
        .route("/summary/:id", get(handlers::summary));

    Router::new()
        .nest("/api/v1/news", news)
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve the API until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await
}

pub mod prelude {
    pub use nr_core::{Article, Result, Error};
    pub use crate::AppState;
}
