use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::foods::import::parse_food_csv;
use crate::foods::model::{Category, FoodRecord};
use crate::state::AppState;
use crate::store::decode_or_default;

pub const FOODS_KEY: &str = "foods";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", put(update_food).delete(delete_food))
        .route("/foods/import", post(import_foods))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "document store error");
    (StatusCode::INTERNAL_SERVER_ERROR, "persistence failure".into())
}

async fn load_catalog(
    state: &AppState,
    user_id: Uuid,
) -> Result<Vec<FoodRecord>, (StatusCode, String)> {
    let doc = state.store.get(user_id, FOODS_KEY).await.map_err(internal)?;
    Ok(decode_or_default(doc, FOODS_KEY))
}

async fn save_catalog(
    state: &AppState,
    user_id: Uuid,
    catalog: &[FoodRecord],
) -> Result<(), (StatusCode, String)> {
    let value = serde_json::to_value(catalog).map_err(internal)?;
    state
        .store
        .put_latest(user_id, FOODS_KEY, value)
        .await
        .map_err(internal)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct FoodQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize)]
pub struct FoodInput {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub proteins: f64,
    #[serde(default)]
    pub fats: f64,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<FoodQuery>,
) -> Result<Json<Vec<FoodRecord>>, (StatusCode, String)> {
    let mut catalog = load_catalog(&state, user_id).await?;
    if let Some(search) = query.search.as_deref().map(str::to_lowercase) {
        catalog.retain(|f| f.name.to_lowercase().contains(&search));
    }
    if let Some(category) = query.category {
        catalog.retain(|f| f.category == category);
    }
    Ok(Json(catalog))
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<FoodInput>,
) -> Result<(StatusCode, Json<FoodRecord>), (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }

    let food = FoodRecord::new(
        name,
        payload.calories,
        payload.carbs,
        payload.proteins,
        payload.fats,
    );

    let mut catalog = load_catalog(&state, user_id).await?;
    catalog.push(food.clone());
    save_catalog(&state, user_id, &catalog).await?;

    info!(user_id = %user_id, food_id = %food.id, "food added");
    Ok((StatusCode::CREATED, Json(food)))
}

#[instrument(skip(state, payload))]
pub async fn update_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FoodInput>,
) -> Result<Json<FoodRecord>, (StatusCode, String)> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }

    let mut catalog = load_catalog(&state, user_id).await?;
    let food = catalog
        .iter_mut()
        .find(|f| f.id == id)
        .ok_or((StatusCode::NOT_FOUND, "food not found".to_string()))?;

    food.name = name;
    food.calories = payload.calories;
    food.carbs = payload.carbs;
    food.proteins = payload.proteins;
    food.fats = payload.fats;
    food.reclassify();
    let updated = food.clone();

    save_catalog(&state, user_id, &catalog).await?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut catalog = load_catalog(&state, user_id).await?;
    let before = catalog.len();
    catalog.retain(|f| f.id != id);
    if catalog.len() == before {
        return Err((StatusCode::NOT_FOUND, "food not found".into()));
    }
    save_catalog(&state, user_id, &catalog).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk import replaces the whole catalog, not appends to it.
#[instrument(skip(state, body))]
pub async fn import_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: String,
) -> Result<Json<ImportReport>, (StatusCode, String)> {
    let foods = parse_food_csv(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid csv: {e}")))?;

    save_catalog(&state, user_id, &foods).await?;

    info!(user_id = %user_id, imported = foods.len(), "food database imported");
    Ok(Json(ImportReport {
        imported: foods.len(),
    }))
}
