use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::calc::model::{self, CalculationsDoc, DailyLimits, PersonalProfile};
use crate::state::AppState;
use crate::store::decode_or_default;

pub const CALCULATIONS_KEY: &str = "calculations";
pub const LIMITS_KEY: &str = "limits";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/calculations",
            get(get_calculations)
                .put(put_calculations)
                .delete(delete_calculations),
        )
        .route("/limits", put(put_limits).get(get_limits))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "document store error");
    (StatusCode::INTERNAL_SERVER_ERROR, "persistence failure".into())
}

async fn load_calculations(
    state: &AppState,
    user_id: Uuid,
) -> Result<CalculationsDoc, (StatusCode, String)> {
    let doc = state
        .store
        .get(user_id, CALCULATIONS_KEY)
        .await
        .map_err(internal)?;
    Ok(decode_or_default(doc, CALCULATIONS_KEY))
}

#[instrument(skip(state))]
pub async fn get_calculations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CalculationsDoc>, (StatusCode, String)> {
    Ok(Json(load_calculations(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn put_calculations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PersonalProfile>,
) -> Result<Json<CalculationsDoc>, (StatusCode, String)> {
    if !payload.has_required_inputs() {
        return Err((
            StatusCode::BAD_REQUEST,
            "age, height and weight must be positive".into(),
        ));
    }

    let profile = payload.normalized();
    let results = model::compute(&profile);
    let doc = CalculationsDoc {
        profile: Some(profile),
        results: Some(results),
    };

    let value = serde_json::to_value(&doc).map_err(internal)?;
    state
        .store
        .put_latest(user_id, CALCULATIONS_KEY, value)
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, "calculations updated");
    Ok(Json(doc))
}

#[instrument(skip(state))]
pub async fn delete_calculations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .store
        .delete(user_id, CALCULATIONS_KEY)
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub limits: DailyLimits,
    pub weekly_total: i64,
    /// From the latest calculation, when one exists.
    pub weekly_calories: Option<f64>,
    /// weekly_total minus rounded weekly_calories.
    pub difference: Option<f64>,
}

async fn limits_response(
    state: &AppState,
    user_id: Uuid,
    limits: DailyLimits,
) -> Result<LimitsResponse, (StatusCode, String)> {
    let weekly_total: i64 = limits.values().sum();
    let weekly_calories = load_calculations(state, user_id)
        .await?
        .results
        .map(|r| r.weekly_calories);
    let difference = weekly_calories.map(|wc| weekly_total as f64 - wc.round());
    Ok(LimitsResponse {
        limits,
        weekly_total,
        weekly_calories,
        difference,
    })
}

#[instrument(skip(state))]
pub async fn get_limits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<LimitsResponse>, (StatusCode, String)> {
    let doc = state.store.get(user_id, LIMITS_KEY).await.map_err(internal)?;
    let limits: DailyLimits = decode_or_default(doc, LIMITS_KEY);
    Ok(Json(limits_response(&state, user_id, limits).await?))
}

#[instrument(skip(state, payload))]
pub async fn put_limits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DailyLimits>,
) -> Result<Json<LimitsResponse>, (StatusCode, String)> {
    let value = serde_json::to_value(&payload).map_err(internal)?;
    state
        .store
        .put_latest(user_id, LIMITS_KEY, value)
        .await
        .map_err(internal)?;
    Ok(Json(limits_response(&state, user_id, payload).await?))
}
