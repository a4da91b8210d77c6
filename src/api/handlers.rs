//! HTTP request handlers

use super::types::{
    ErrorResponse, HealthResponse, RevenueResponse, RevenueSummary, SessionListResponse, UssdForm,
};
use super::AppState;
use crate::dispatcher::UssdRequest;
use crate::stats::StatsSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Aggregator callback
        .route("/ussd", post(handle_ussd))
        // Dashboard reporting
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/sessions", get(list_sessions))
        .route("/revenue", get(revenue))
        .with_state(state)
}

// ============================================================
// USSD Callback
// ============================================================

async fn handle_ussd(
    State(state): State<AppState>,
    Form(form): Form<UssdForm>,
) -> Result<String, AppError> {
    let request = UssdRequest {
        session_id: required(form.session_id, "sessionId")?,
        phone_number: required(form.phone_number, "phoneNumber")?,
        text: form.text.unwrap_or_default(),
        service_code: form.service_code,
    };

    let reply = state.dispatcher.handle(&request).await;
    Ok(reply.to_wire())
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => {
            tracing::warn!(field, "Rejected USSD request with missing field");
            Err(AppError::BadRequest(format!("Missing required field: {field}")))
        }
    }
}

// ============================================================
// Reporting
// ============================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let dispatcher = &state.dispatcher;
    let revenue = dispatcher.revenue().await;
    let stats = dispatcher.stats().snapshot().await;
    let active_sessions = dispatcher.store().len().await;
    let uptime = dispatcher.clock().now() - stats.started_at;

    Json(HealthResponse {
        connected: true,
        active_sessions,
        total_sessions_today: stats.total_sessions_today,
        success_rate: stats.success_rate(),
        average_response_time_ms: stats.average_response_time_ms(),
        peak_sessions: stats.peak_sessions,
        failed_sessions: stats.failed_sessions,
        last_session_time: stats.last_session_at,
        uptime_seconds: u64::try_from(uptime.num_seconds()).unwrap_or(0),
        revenue: RevenueSummary {
            confirmed_total: revenue.confirmed_total,
            pending_total: revenue.pending_total,
            revenue_today: revenue.revenue_today,
            tickets_today: revenue.tickets_today,
        },
    })
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.dispatcher.stats().snapshot().await)
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let mut sessions = state.dispatcher.store().list().await;
    sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    Json(SessionListResponse {
        count: sessions.len(),
        sessions,
    })
}

async fn revenue(State(state): State<AppState>) -> Json<RevenueResponse> {
    let metrics = state.dispatcher.revenue().await;
    Json(RevenueResponse {
        metrics,
        pricing: state.dispatcher.prices().by_route(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
