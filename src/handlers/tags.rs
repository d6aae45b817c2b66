use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::tag;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::AuthUser;
use crate::extract::ValidatedJson;
use crate::schemas::{
    bad_request, database_error, not_found, unique_or_database_error, ApiError, ApiResponse, AppState,
};

/// Request body for renaming a tag
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateTagRequest {
    /// New name, unique among the user's tags
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Request body for a partial tag update
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchTagRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Response structure for tag operations
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

/// Filters shared by the tag and ingredient listings
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AssignedOnlyQuery {
    /// `1` limits the listing to items attached to at least one recipe
    #[validate(range(min = 0, max = 1))]
    pub assigned_only: Option<u8>,
}

impl AssignedOnlyQuery {
    pub fn enabled(&self) -> bool {
        self.assigned_only == Some(1)
    }
}

/// Trims a submitted name and rejects it if nothing is left.
pub(crate) fn clean_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(bad_request("VALIDATION_ERROR", "name: This field may not be blank."));
    }
    Ok(trimmed.to_string())
}

async fn find_owned_tag(state: &AppState, user_id: i32, tag_id: i32) -> Result<tag::Model, ApiError> {
    tag::Entity::find_by_id(tag_id)
        .filter(tag::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch tag", e))?
        .ok_or_else(|| {
            warn!("Tag {} not found for user {}", tag_id, user_id);
            not_found("Tag")
        })
}

async fn rename_tag(state: &AppState, existing: tag::Model, name: String) -> Result<tag::Model, ApiError> {
    let tag_id = existing.id;
    let mut active: tag::ActiveModel = existing.into();
    active.name = Set(name.clone());

    let updated = active.update(&state.db).await.map_err(|e| {
        unique_or_database_error(
            "Failed to update tag",
            format!("Tag with name '{}' already exists", name),
            e,
        )
    })?;

    info!("Tag {} renamed to '{}'", tag_id, updated.name);
    Ok(updated)
}

/// List the authenticated user's tags
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "tags",
    params(AssignedOnlyQuery),
    responses(
        (status = 200, description = "Tags retrieved successfully", body = TagListApiResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Valid(Query(query)): Valid<Query<AssignedOnlyQuery>>,
) -> Result<Json<ApiResponse<Vec<TagResponse>>>, ApiError> {
    trace!("Entering get_tags function");

    let mut select = tag::Entity::find().filter(tag::Column::UserId.eq(user.id));
    if query.enabled() {
        debug!("Restricting tags to those assigned to recipes");
        select = select
            .join(JoinType::InnerJoin, tag::Relation::RecipeTag.def())
            .distinct();
    }

    let tags = select
        .order_by_desc(tag::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch tags", e))?;

    info!("Retrieved {} tags for user {}", tags.len(), user.id);
    let data = tags.into_iter().map(TagResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Tags retrieved successfully")))
}

/// Get one of the authenticated user's tags
#[utoipa::path(
    get,
    path = "/api/v1/tags/{tag_id}",
    tag = "tags",
    params(("tag_id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag retrieved successfully", body = TagApiResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_tag(
    Path(tag_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    let found = find_owned_tag(&state, user.id, tag_id).await?;
    debug!("Found tag {}", found.id);
    Ok(Json(ApiResponse::new(TagResponse::from(found), "Tag retrieved successfully")))
}

/// Rename a tag
#[utoipa::path(
    put,
    path = "/api/v1/tags/{tag_id}",
    tag = "tags",
    params(("tag_id" = i32, Path, description = "Tag ID")),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated successfully", body = TagApiResponse),
        (status = 400, description = "Invalid name or name already used", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn update_tag(
    Path(tag_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateTagRequest>,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    let name = clean_name(&request.name)?;
    let existing = find_owned_tag(&state, user.id, tag_id).await?;
    let updated = rename_tag(&state, existing, name).await?;
    Ok(Json(ApiResponse::new(TagResponse::from(updated), "Tag updated successfully")))
}

/// Partially update a tag
#[utoipa::path(
    patch,
    path = "/api/v1/tags/{tag_id}",
    tag = "tags",
    params(("tag_id" = i32, Path, description = "Tag ID")),
    request_body = PatchTagRequest,
    responses(
        (status = 200, description = "Tag updated successfully", body = TagApiResponse),
        (status = 400, description = "Invalid name or name already used", body = ErrorResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn patch_tag(
    Path(tag_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<PatchTagRequest>,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    let existing = find_owned_tag(&state, user.id, tag_id).await?;
    let updated = match request.name {
        Some(name) => rename_tag(&state, existing, clean_name(&name)?).await?,
        None => {
            debug!("Empty patch for tag {}", tag_id);
            existing
        }
    };
    Ok(Json(ApiResponse::new(TagResponse::from(updated), "Tag updated successfully")))
}

/// Delete a tag, detaching it from every recipe
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{tag_id}",
    tag = "tags",
    params(("tag_id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_tag(
    Path(tag_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_tag(&state, user.id, tag_id).await?;

    tag::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete tag", e))?;

    info!("Tag {} deleted", tag_id);
    Ok(StatusCode::NO_CONTENT)
}
