//! tierscale-api — read-only HTTP API for the autoscaler daemon.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/decisions?limit=N` | Recent journal entries, newest first |
//! | GET | `/api/v1/decisions/latest` | Newest journal entry |
//! | GET | `/api/v1/decisions/{seq}` | One journal entry |
//! | GET | `/api/v1/catalog` | Tier catalog by generation |
//! | GET | `/api/v1/policy` | Active scaling policy |
//! | GET | `/healthz` | Liveness |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tierscale_core::{ScalingPolicy, TierCatalog};
use tierscale_state::Journal;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub journal: Journal,
    pub catalog: Arc<TierCatalog>,
    pub policy: ScalingPolicy,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/decisions", get(handlers::list_decisions))
        .route("/decisions/latest", get(handlers::latest_decision))
        .route("/decisions/{seq}", get(handlers::get_decision))
        .route("/catalog", get(handlers::get_catalog))
        .route("/policy", get(handlers::get_policy))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics).with_state(state))
}
