use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{history, stats};
use crate::error::Result;
use crate::models::{distribution_by_day, DayCounts, PieChart};
use crate::routes::validation::parse_date;
use crate::session::AuthSession;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub real: u64,
    pub deepfake: u64,
    pub total: u64,
    pub chart: Option<PieChart>,
    pub message: Option<&'static str>,
}

/// Overall prediction counters plus the aggregate pie chart
pub async fn get_stats(
    State(state): State<AppState>,
    _auth: AuthSession,
) -> Result<Json<StatsResponse>> {
    let db = state.db.clone();
    let totals = tokio::task::spawn_blocking(move || stats::read(&db)).await??;

    let chart = PieChart::real_vs_fake(
        "Prediction Distribution (Overall)",
        totals.real,
        totals.deepfake,
    );
    let message = chart.is_none().then_some("No predictions yet.");

    Ok(Json(StatsResponse {
        real: totals.real,
        deepfake: totals.deepfake,
        total: totals.total,
        chart,
        message,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// `YYYY-MM-DD`; defaults to the most recent day with predictions
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyResponse {
    /// Every day with at least one valid entry, ascending
    pub dates: Vec<NaiveDate>,
    pub selected_date: Option<NaiveDate>,
    pub counts: Option<DayCounts>,
    pub chart: Option<PieChart>,
    pub message: Option<String>,
}

/// Per-day prediction distribution
///
/// GET /api/history/daily?date=YYYY-MM-DD
pub async fn get_daily_distribution(
    State(state): State<AppState>,
    _auth: AuthSession,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailyResponse>> {
    let requested = query.date.as_deref().map(parse_date).transpose()?;

    let db = state.db.clone();
    let entries = tokio::task::spawn_blocking(move || history::read_all(&db)).await??;

    if entries.is_empty() {
        return Ok(Json(DailyResponse {
            dates: Vec::new(),
            selected_date: None,
            counts: None,
            chart: None,
            message: Some("No prediction history yet.".to_string()),
        }));
    }

    let days = distribution_by_day(&entries);
    let dates: Vec<NaiveDate> = days.keys().copied().collect();

    let Some(selected) = requested.or_else(|| dates.last().copied()) else {
        return Ok(Json(DailyResponse {
            dates,
            selected_date: None,
            counts: None,
            chart: None,
            message: Some("No valid prediction timestamps found.".to_string()),
        }));
    };

    let counts = days.get(&selected).copied().unwrap_or_default();
    let chart = PieChart::real_vs_fake(
        format!("Prediction Distribution on {selected}"),
        counts.real_count,
        counts.fake_count,
    );
    let message = chart
        .is_none()
        .then(|| format!("No predictions on {selected}."));

    Ok(Json(DailyResponse {
        dates,
        selected_date: Some(selected),
        counts: Some(counts),
        chart,
        message,
    }))
}
