mod handlers;
mod state;

pub use state::{AppState, Resource};

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::store::{Restaurant, UserLocation};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(handlers::api_root))
        .route("/api/restaurants/nearby/", get(handlers::nearby_restaurants))
        .merge(resource_routes::<UserLocation>())
        .merge(resource_routes::<Restaurant>())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn resource_routes<T: Resource>() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("/api/{}/", T::PATH),
            get(handlers::list::<T>).post(handlers::create::<T>),
        )
        .route(
            &format!("/api/{}/{{id}}/", T::PATH),
            get(handlers::retrieve::<T>)
                .put(handlers::update::<T>)
                .patch(handlers::partial_update::<T>)
                .delete(handlers::destroy::<T>),
        )
}

pub async fn start(config: &Config) -> anyhow::Result<()> {
    let state = AppState::open(config).context("failed to open the data directory")?;
    let app = build_router(Arc::new(state));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind to {addr}"))?;

    info!("webmap listening on http://{addr}");
    info!("press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
