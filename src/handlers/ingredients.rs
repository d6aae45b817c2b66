use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::ingredient;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::extract::ValidatedJson;
use crate::handlers::tags::{clean_name, AssignedOnlyQuery};
use crate::schemas::{database_error, not_found, unique_or_database_error, ApiError, ApiResponse, AppState};

/// Request body for renaming an ingredient
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateIngredientRequest {
    /// New name, unique among the user's ingredients
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Request body for a partial ingredient update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchIngredientRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Response structure for ingredient operations
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(model: ingredient::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

async fn find_owned_ingredient(
    state: &AppState,
    user_id: i32,
    ingredient_id: i32,
) -> Result<ingredient::Model, ApiError> {
    ingredient::Entity::find_by_id(ingredient_id)
        .filter(ingredient::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch ingredient", e))?
        .ok_or_else(|| {
            warn!("Ingredient {} not found for user {}", ingredient_id, user_id);
            not_found("Ingredient")
        })
}

async fn rename_ingredient(
    state: &AppState,
    existing: ingredient::Model,
    name: String,
) -> Result<ingredient::Model, ApiError> {
    let ingredient_id = existing.id;
    let mut active: ingredient::ActiveModel = existing.into();
    active.name = Set(name.clone());

    let updated = active.update(&state.db).await.map_err(|e| {
        unique_or_database_error(
            "Failed to update ingredient",
            format!("Ingredient with name '{}' already exists", name),
            e,
        )
    })?;

    info!("Ingredient {} renamed to '{}'", ingredient_id, updated.name);
    Ok(updated)
}

/// List the authenticated user's ingredients
#[utoipa::path(
    get,
    path = "/api/v1/ingredients",
    tag = "ingredients",
    params(AssignedOnlyQuery),
    responses(
        (status = 200, description = "Ingredients retrieved successfully", body = IngredientListApiResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_ingredients(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Valid(Query(query)): Valid<Query<AssignedOnlyQuery>>,
) -> Result<Json<ApiResponse<Vec<IngredientResponse>>>, ApiError> {
    trace!("Entering get_ingredients function");

    let mut select = ingredient::Entity::find().filter(ingredient::Column::UserId.eq(user.id));
    if query.enabled() {
        debug!("Restricting ingredients to those assigned to recipes");
        select = select
            .join(JoinType::InnerJoin, ingredient::Relation::RecipeIngredient.def())
            .distinct();
    }

    let ingredients = select
        .order_by_desc(ingredient::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch ingredients", e))?;

    info!("Retrieved {} ingredients for user {}", ingredients.len(), user.id);
    let data = ingredients.into_iter().map(IngredientResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Ingredients retrieved successfully")))
}

/// Get one of the authenticated user's ingredients
#[utoipa::path(
    get,
    path = "/api/v1/ingredients/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient retrieved successfully", body = IngredientApiResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<IngredientResponse>>, ApiError> {
    let found = find_owned_ingredient(&state, user.id, ingredient_id).await?;
    debug!("Found ingredient {}", found.id);
    Ok(Json(ApiResponse::new(IngredientResponse::from(found), "Ingredient retrieved successfully")))
}

/// Rename an ingredient
#[utoipa::path(
    put,
    path = "/api/v1/ingredients/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    request_body = UpdateIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated successfully", body = IngredientApiResponse),
        (status = 400, description = "Invalid name or name already used", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn update_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateIngredientRequest>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ApiError> {
    let name = clean_name(&request.name)?;
    let existing = find_owned_ingredient(&state, user.id, ingredient_id).await?;
    let updated = rename_ingredient(&state, existing, name).await?;
    Ok(Json(ApiResponse::new(IngredientResponse::from(updated), "Ingredient updated successfully")))
}

/// Partially update an ingredient
#[utoipa::path(
    patch,
    path = "/api/v1/ingredients/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    request_body = PatchIngredientRequest,
    responses(
        (status = 200, description = "Ingredient updated successfully", body = IngredientApiResponse),
        (status = 400, description = "Invalid name or name already used", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn patch_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<PatchIngredientRequest>,
) -> Result<Json<ApiResponse<IngredientResponse>>, ApiError> {
    let existing = find_owned_ingredient(&state, user.id, ingredient_id).await?;
    let updated = match request.name {
        Some(name) => rename_ingredient(&state, existing, clean_name(&name)?).await?,
        None => {
            debug!("Empty patch for ingredient {}", ingredient_id);
            existing
        }
    };
    Ok(Json(ApiResponse::new(IngredientResponse::from(updated), "Ingredient updated successfully")))
}

/// Delete an ingredient, detaching it from every recipe
#[utoipa::path(
    delete,
    path = "/api/v1/ingredients/{ingredient_id}",
    tag = "ingredients",
    params(("ingredient_id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_ingredient(
    Path(ingredient_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_ingredient(&state, user.id, ingredient_id).await?;

    ingredient::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete ingredient", e))?;

    info!("Ingredient {} deleted", ingredient_id);
    Ok(StatusCode::NO_CONTENT)
}
