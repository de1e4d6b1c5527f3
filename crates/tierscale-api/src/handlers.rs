//! HTTP handlers.
//!
//! Each handler reads from the journal or the shared catalog/policy and
//! returns JSON responses.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tierscale_state::{JournalEntry, JournalTotals, StateResult};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

// ── Decisions ──────────────────────────────────────────────────

/// GET /api/v1/decisions
pub async fn list_decisions(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    match state.journal.recent(limit) {
        Ok(entries) => ApiResponse::ok(entries).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/decisions/latest
pub async fn latest_decision(State(state): State<ApiState>) -> impl IntoResponse {
    match state.journal.latest() {
        Ok(Some(entry)) => ApiResponse::ok(entry).into_response(),
        Ok(None) => error_response("no decisions recorded yet", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/decisions/{seq}
pub async fn get_decision(
    State(state): State<ApiState>,
    Path(seq): Path<u64>,
) -> impl IntoResponse {
    match state.journal.get(seq) {
        Ok(Some(entry)) => ApiResponse::ok(entry).into_response(),
        Ok(None) => {
            error_response(&format!("decision {seq} not found"), StatusCode::NOT_FOUND)
                .into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Catalog & policy ───────────────────────────────────────────

/// GET /api/v1/catalog
pub async fn get_catalog(State(state): State<ApiState>) -> impl IntoResponse {
    let catalog: BTreeMap<u32, Vec<String>> = state
        .catalog
        .generations()
        .map(|g| {
            let labels = state
                .catalog
                .tiers(g)
                .unwrap_or_default()
                .iter()
                .map(|t| t.label())
                .collect();
            (g, labels)
        })
        .collect();
    ApiResponse::ok(catalog)
}

/// GET /api/v1/policy
pub async fn get_policy(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.policy)
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let scrape = state
        .journal
        .latest()
        .and_then(|latest| Ok((latest, state.journal.totals()?)));
    metrics_response(scrape)
}

fn metrics_response(scrape: StateResult<(Option<JournalEntry>, JournalTotals)>) -> Response {
    match scrape {
        Ok((latest, totals)) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            tierscale_metrics::render_prometheus(latest.as_ref(), &totals),
        )
            .into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tierscale_core::{Action, Decision, Reason, ScalingPolicy, Tier, TierCatalog, UtilizationSample};
    use tierscale_state::{ApplyStatus, Journal, StateError};

    fn test_state() -> ApiState {
        ApiState {
            journal: Journal::open_in_memory().unwrap(),
            catalog: Arc::new(TierCatalog::hyperscale()),
            policy: ScalingPolicy::default(),
        }
    }

    fn record_scale_up(state: &ApiState) -> JournalEntry {
        let sample = UtilizationSample {
            timestamp: 1000,
            service_objective: "HS_Gen5_8".to_string(),
            avg_cpu_percent: 90.0,
            moving_avg_cpu_percent: 85.0,
            data_points: 5,
        };
        let decision = Decision {
            action: Action::ScaleUp,
            current: Tier::new(5, 8),
            target: Tier::new(5, 10),
            reason: Reason::HighThreshold,
        };
        state
            .journal
            .record(JournalEntry::new(sample, decision, ApplyStatus::Applied))
            .unwrap()
    }

    #[tokio::test]
    async fn list_decisions_empty() {
        let state = test_state();
        let resp = list_decisions(State(state), Query(ListParams { limit: None })).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn latest_decision_missing() {
        let state = test_state();
        let resp = latest_decision(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_recorded_decision() {
        let state = test_state();
        let entry = record_scale_up(&state);

        let resp = get_decision(State(state.clone()), Path(entry.seq)).await;
        assert_eq!(resp.into_response().status(), StatusCode::OK);

        let resp = get_decision(State(state), Path(entry.seq + 1)).await;
        assert_eq!(resp.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_and_policy_are_served() {
        let state = test_state();
        let resp = get_catalog(State(state.clone())).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = get_policy(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state();
        record_scale_up(&state);
        let resp = prometheus_metrics(State(state)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[test]
    fn prometheus_read_failure_is_server_error() {
        let resp = metrics_response(Err(StateError::Read("corrupt page".to_string())));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
