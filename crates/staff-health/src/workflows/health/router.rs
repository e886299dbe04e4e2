use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::EmployeeId;
use super::repository::{HealthRepository, SettingsStore};
use super::service::{HealthScoreError, HealthScoreService};

#[derive(Debug, Default, Deserialize)]
pub struct HealthScoreQuery {
    #[serde(default)]
    pub date: Option<String>,
}

/// Router builder exposing the health score lookup.
pub fn health_router<R, S>(service: Arc<HealthScoreService<R, S>>) -> Router
where
    R: HealthRepository + 'static,
    S: SettingsStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/employees/:employee_id/health-score",
            get(health_score_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn health_score_handler<R, S>(
    State(service): State<Arc<HealthScoreService<R, S>>>,
    Path(employee_id): Path<String>,
    Query(query): Query<HealthScoreQuery>,
) -> Response
where
    R: HealthRepository + 'static,
    S: SettingsStore + 'static,
{
    let reference_date = match query.date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                let payload = json!({
                    "error": format!("date '{raw}' must be formatted as YYYY-MM-DD"),
                });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
        _ => Utc::now().with_timezone(&service.timezone()).date_naive(),
    };

    let id = EmployeeId(employee_id);
    match service.compute_health_score(&id, reference_date).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(HealthScoreError::EmployeeNotFound(_)) => {
            let payload = json!({
                "error": "employee not found",
                "employee_id": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
