use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::calc::handlers::{CALCULATIONS_KEY, LIMITS_KEY};
use crate::calc::model::{CalculationsDoc, DailyLimits, Weekday};
use crate::diet::model::{day_key, DayPlan, EntryUpdate, MacroTotals, MealEntry, MealSlot, ALL_SLOTS};
use crate::foods::handlers::FOODS_KEY;
use crate::foods::model::FoodRecord;
use crate::state::AppState;
use crate::store::decode_or_default;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/diet/:week/:day", get(get_day))
        .route("/diet/:week/:day/stats", get(day_stats))
        .route("/diet/:week/:day/:slot/entries", post(add_entry))
        .route(
            "/diet/:week/:day/:slot/entries/:id",
            axum::routing::patch(update_entry).delete(remove_entry),
        )
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "document store error");
    (StatusCode::INTERNAL_SERVER_ERROR, "persistence failure".into())
}

fn check_day(day: u8) -> Result<(), (StatusCode, String)> {
    if day > 6 {
        return Err((StatusCode::BAD_REQUEST, "day index must be 0..=6".into()));
    }
    Ok(())
}

async fn load_day(
    state: &AppState,
    user_id: Uuid,
    week: i64,
    day: u8,
) -> Result<DayPlan, (StatusCode, String)> {
    let key = day_key(week, day);
    let doc = state.store.get(user_id, &key).await.map_err(internal)?;
    Ok(decode_or_default(doc, &key))
}

async fn save_day(
    state: &AppState,
    user_id: Uuid,
    week: i64,
    day: u8,
    plan: &DayPlan,
) -> Result<(), (StatusCode, String)> {
    let value = serde_json::to_value(plan).map_err(internal)?;
    state
        .store
        .put_latest(user_id, &day_key(week, day), value)
        .await
        .map_err(internal)?;
    Ok(())
}

#[instrument(skip(state))]
pub async fn get_day(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((week, day)): Path<(i64, u8)>,
) -> Result<Json<DayPlan>, (StatusCode, String)> {
    check_day(day)?;
    Ok(Json(load_day(&state, user_id, week, day).await?))
}

#[instrument(skip(state))]
pub async fn add_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((week, day, slot)): Path<(i64, u8, MealSlot)>,
) -> Result<(StatusCode, Json<MealEntry>), (StatusCode, String)> {
    check_day(day)?;
    let mut plan = load_day(&state, user_id, week, day).await?;
    let entry = MealEntry::blank();
    plan.slot_mut(slot).push(entry.clone());
    save_day(&state, user_id, week, day, &plan).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((week, day, slot, id)): Path<(i64, u8, MealSlot, Uuid)>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<MealEntry>, (StatusCode, String)> {
    check_day(day)?;

    // The catalog is only needed when a food name changes, but loading it
    // unconditionally keeps the merge in one place.
    let catalog_doc = state.store.get(user_id, FOODS_KEY).await.map_err(internal)?;
    let catalog: Vec<FoodRecord> = decode_or_default(catalog_doc, FOODS_KEY);

    let mut plan = load_day(&state, user_id, week, day).await?;
    let entry = plan
        .slot_mut(slot)
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or((StatusCode::NOT_FOUND, "entry not found".to_string()))?;

    entry.apply(&payload, &catalog);
    let updated = entry.clone();

    save_day(&state, user_id, week, day, &plan).await?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn remove_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((week, day, slot, id)): Path<(i64, u8, MealSlot, Uuid)>,
) -> Result<StatusCode, (StatusCode, String)> {
    check_day(day)?;
    let mut plan = load_day(&state, user_id, week, day).await?;
    let entries = plan.slot_mut(slot);
    let before = entries.len();
    entries.retain(|e| e.id != id);
    if entries.len() == before {
        return Err((StatusCode::NOT_FOUND, "entry not found".into()));
    }
    save_day(&state, user_id, week, day, &plan).await?;
    info!(user_id = %user_id, %id, "meal entry removed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct SlotStats {
    pub slot: MealSlot,
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
    pub carbs_pct: f64,
    pub proteins_pct: f64,
    pub fats_pct: f64,
}

/// Informational only: limits and goals are shown against the totals, never
/// enforced.
#[derive(Debug, Serialize)]
pub struct DayStatsResponse {
    pub calories: f64,
    pub proteins: f64,
    pub calorie_limit: Option<i64>,
    pub protein_goal: Option<f64>,
    pub slots: Vec<SlotStats>,
}

#[instrument(skip(state))]
pub async fn day_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((week, day)): Path<(i64, u8)>,
) -> Result<Json<DayStatsResponse>, (StatusCode, String)> {
    check_day(day)?;
    let plan = load_day(&state, user_id, week, day).await?;

    let mut calories = 0.0;
    let mut proteins = 0.0;
    let mut slots = Vec::with_capacity(ALL_SLOTS.len());
    for slot in ALL_SLOTS {
        let totals = MacroTotals::of(plan.slot(slot));
        let (carbs_pct, proteins_pct, fats_pct) = totals.macro_percentages();
        calories += totals.calories;
        proteins += totals.proteins;
        slots.push(SlotStats {
            slot,
            calories: totals.calories,
            proteins: totals.proteins,
            carbs: totals.carbs,
            fats: totals.fats,
            carbs_pct,
            proteins_pct,
            fats_pct,
        });
    }

    let limits_doc = state.store.get(user_id, LIMITS_KEY).await.map_err(internal)?;
    let limits: DailyLimits = decode_or_default(limits_doc, LIMITS_KEY);
    let calorie_limit = Weekday::from_index(day).and_then(|w| limits.get(&w).copied());

    let calc_doc = state
        .store
        .get(user_id, CALCULATIONS_KEY)
        .await
        .map_err(internal)?;
    let calculations: CalculationsDoc = decode_or_default(calc_doc, CALCULATIONS_KEY);
    let protein_goal = calculations.results.map(|r| r.daily_protein_rda);

    Ok(Json(DayStatsResponse {
        calories,
        proteins,
        calorie_limit,
        protein_goal,
        slots,
    }))
}
