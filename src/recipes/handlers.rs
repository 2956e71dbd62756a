use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::diet::model::{EntryUpdate, MealEntry};
use crate::foods::handlers::FOODS_KEY;
use crate::foods::model::FoodRecord;
use crate::recipes::export::{export_filename, to_csv};
use crate::recipes::model::{recipe_key, Recipe, RecipeSummary};
use crate::state::AppState;
use crate::store::decode_or_default;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route(
            "/recipes/:name",
            get(get_recipe).put(put_recipe).delete(delete_recipe),
        )
        .route("/recipes/:name/rename", post(rename_recipe))
        .route("/recipes/:name/export", get(export_recipe))
        .route("/recipes/:name/ingredients", post(add_ingredient))
        .route(
            "/recipes/:name/ingredients/:id",
            axum::routing::patch(update_ingredient).delete(remove_ingredient),
        )
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "document store error");
    (StatusCode::INTERNAL_SERVER_ERROR, "persistence failure".into())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "recipe not found".into())
}

async fn load_recipe(
    state: &AppState,
    user_id: Uuid,
    name: &str,
) -> Result<Option<Recipe>, (StatusCode, String)> {
    let key = recipe_key(name);
    let doc = state.store.get(user_id, &key).await.map_err(internal)?;
    match doc {
        None => Ok(None),
        Some(value) => match serde_json::from_value(value) {
            Ok(recipe) => Ok(Some(recipe)),
            Err(e) => {
                // Malformed stored recipe reads as absent.
                warn!(error = %e, key, "malformed stored recipe");
                Ok(None)
            }
        },
    }
}

async fn save_recipe(
    state: &AppState,
    user_id: Uuid,
    recipe: &Recipe,
) -> Result<(), (StatusCode, String)> {
    let value = serde_json::to_value(recipe).map_err(internal)?;
    state
        .store
        .put_latest(user_id, &recipe_key(&recipe.name), value)
        .await
        .map_err(internal)?;
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RecipeSummary>>, (StatusCode, String)> {
    let docs = state
        .store
        .list(user_id, "recipes/")
        .await
        .map_err(internal)?;

    let summaries = docs
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<Recipe>(value) {
            Ok(recipe) => Some(RecipeSummary::from(&recipe)),
            Err(e) => {
                warn!(error = %e, key, "malformed stored recipe, skipping");
                None
            }
        })
        .collect();
    Ok(Json(summaries))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(recipe))
}

#[derive(Debug, Deserialize)]
pub struct PutRecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<MealEntry>,
}

/// Create or replace a recipe. Totals always come out of `recompute`;
/// whatever aggregates the client may think it has are ignored.
#[instrument(skip(state, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
    Json(payload): Json<PutRecipeRequest>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "recipe name is required".into()));
    }

    let recipe = Recipe::new(name, payload.ingredients);
    save_recipe(&state, user_id, &recipe).await?;
    info!(user_id = %user_id, recipe = %recipe.name, "recipe saved");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .store
        .delete(user_id, &recipe_key(&name))
        .await
        .map_err(internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

/// Rename moves the document: the recipe is written under the new key and
/// the old key is deleted, so no stale copy is left behind.
#[instrument(skip(state, payload))]
pub async fn rename_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let new_name = payload.new_name.trim().to_string();
    if new_name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "recipe name is required".into()));
    }

    let mut recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;

    if new_name == recipe.name {
        return Ok(Json(recipe));
    }

    recipe.name = new_name;
    save_recipe(&state, user_id, &recipe).await?;
    state
        .store
        .delete(user_id, &recipe_key(&name))
        .await
        .map_err(internal)?;

    info!(user_id = %user_id, from = %name, to = %recipe.name, "recipe renamed");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn add_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<MealEntry>), (StatusCode, String)> {
    let mut recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;

    let ingredient = MealEntry::blank();
    recipe.ingredients.push(ingredient.clone());
    recipe.recompute();
    save_recipe(&state, user_id, &recipe).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((name, id)): Path<(String, Uuid)>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let catalog_doc = state.store.get(user_id, FOODS_KEY).await.map_err(internal)?;
    let catalog: Vec<FoodRecord> = decode_or_default(catalog_doc, FOODS_KEY);

    let mut recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;

    let ingredient = recipe
        .ingredients
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or((StatusCode::NOT_FOUND, "ingredient not found".to_string()))?;

    ingredient.apply(&payload, &catalog);
    recipe.recompute();
    save_recipe(&state, user_id, &recipe).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn remove_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((name, id)): Path<(String, Uuid)>,
) -> Result<Json<Recipe>, (StatusCode, String)> {
    let mut recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;

    let before = recipe.ingredients.len();
    recipe.ingredients.retain(|i| i.id != id);
    if recipe.ingredients.len() == before {
        return Err((StatusCode::NOT_FOUND, "ingredient not found".into()));
    }
    recipe.recompute();
    save_recipe(&state, user_id, &recipe).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn export_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(name): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), (StatusCode, String)> {
    let recipe = load_recipe(&state, user_id, &name)
        .await?
        .ok_or_else(not_found)?;

    let csv = to_csv(&recipe).map_err(internal)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/csv; charset=utf-8".parse().unwrap(),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!(
            "attachment; filename=\"{}\"",
            export_filename(&recipe.name)
        )
        .parse()
        .map_err(internal)?,
    );
    Ok((headers, csv))
}
