//! API request and response types

use crate::ledger::RevenueMetrics;
use crate::session::Session;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form posted by the USSD aggregator
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdForm {
    pub session_id: Option<String>,
    pub phone_number: Option<String>,
    pub text: Option<String>,
    pub service_code: Option<String>,
}

/// Revenue block embedded in the health report
#[derive(Debug, Serialize)]
pub struct RevenueSummary {
    pub confirmed_total: Decimal,
    pub pending_total: Decimal,
    pub revenue_today: Decimal,
    pub tickets_today: u64,
}

/// Response for the dashboard health probe
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub connected: bool,
    pub active_sessions: usize,
    pub total_sessions_today: u64,
    pub success_rate: f64,
    pub average_response_time_ms: u64,
    pub peak_sessions: usize,
    pub failed_sessions: u64,
    pub last_session_time: Option<DateTime<Utc>>,
    pub uptime_seconds: u64,
    pub revenue: RevenueSummary,
}

/// Response with the live sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub count: usize,
    pub sessions: Vec<Session>,
}

/// Revenue metrics plus the fare table, keyed route code then class
#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    #[serde(flatten)]
    pub metrics: RevenueMetrics,
    pub pricing: BTreeMap<&'static str, BTreeMap<&'static str, Decimal>>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
