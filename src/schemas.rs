use std::path::PathBuf;

use axum::{http::StatusCode, response::Json};
use moka::future::Cache;
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::handlers::ingredients::{IngredientResponse, PatchIngredientRequest, UpdateIngredientRequest};
use crate::handlers::recipes::{
    CreateRecipeRequest, NamedItem, PatchRecipeRequest, RecipeDetailResponse, RecipeImageResponse, RecipeImageUpload,
    RecipeResponse, UpdateRecipeRequest,
};
use crate::handlers::tags::{PatchTagRequest, TagResponse, UpdateTagRequest};
use crate::handlers::users::{CreateUserRequest, TokenRequest, TokenResponse, UpdateUserRequest, UserResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token key to user id, so repeated requests skip the token table
    pub token_cache: Cache<String, i32>,
    /// Directory uploaded files are written to and served from
    pub media_root: PathBuf,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
#[aliases(
    UserApiResponse = ApiResponse<UserResponse>,
    TokenApiResponse = ApiResponse<TokenResponse>,
    RecipeListApiResponse = ApiResponse<Vec<RecipeResponse>>,
    RecipeDetailApiResponse = ApiResponse<RecipeDetailResponse>,
    RecipeImageApiResponse = ApiResponse<RecipeImageResponse>,
    TagApiResponse = ApiResponse<TagResponse>,
    TagListApiResponse = ApiResponse<Vec<TagResponse>>,
    IngredientApiResponse = ApiResponse<IngredientResponse>,
    IngredientListApiResponse = ApiResponse<Vec<IngredientResponse>>
)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

pub fn bad_request(code: &str, message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, code, message)
}

pub fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
}

pub fn unauthorized(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED", message)
}

/// Logs the database error and hides its details from the client.
pub fn database_error(context: &str, err: DbErr) -> ApiError {
    error!("{}: {}", context, err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", context)
}

/// Maps a unique constraint violation to 400, anything else to 500.
pub fn unique_or_database_error(context: &str, conflict: impl Into<String>, err: DbErr) -> ApiError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        let conflict = conflict.into();
        warn!("{}: {}", context, conflict);
        return bad_request("ALREADY_EXISTS", conflict);
    }
    database_error(context, err)
}

/// Maps errors of the association layer.
pub fn compute_error(context: &str, err: compute::ComputeError) -> ApiError {
    match err {
        compute::ComputeError::Validation(message) => {
            warn!("{}: {}", context, message);
            bad_request("VALIDATION_ERROR", message)
        }
        compute::ComputeError::Database(db_err) => unique_or_database_error(context, context, db_err),
    }
}

/// Registers the `Authorization: Token <key>` scheme.
struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token_auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token authentication, formatted as `Token <key>`",
                ))),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::create_user,
        crate::handlers::users::create_token,
        crate::handlers::users::get_me,
        crate::handlers::users::update_me,
        crate::handlers::users::patch_me,
        crate::handlers::recipes::get_recipes,
        crate::handlers::recipes::create_recipe,
        crate::handlers::recipes::get_recipe,
        crate::handlers::recipes::update_recipe,
        crate::handlers::recipes::patch_recipe,
        crate::handlers::recipes::delete_recipe,
        crate::handlers::recipes::upload_recipe_image,
        crate::handlers::tags::get_tags,
        crate::handlers::tags::get_tag,
        crate::handlers::tags::update_tag,
        crate::handlers::tags::patch_tag,
        crate::handlers::tags::delete_tag,
        crate::handlers::ingredients::get_ingredients,
        crate::handlers::ingredients::get_ingredient,
        crate::handlers::ingredients::update_ingredient,
        crate::handlers::ingredients::patch_ingredient,
        crate::handlers::ingredients::delete_ingredient,
    ),
    components(
        schemas(
            UserApiResponse,
            TokenApiResponse,
            RecipeListApiResponse,
            RecipeDetailApiResponse,
            RecipeImageApiResponse,
            TagApiResponse,
            TagListApiResponse,
            IngredientApiResponse,
            IngredientListApiResponse,
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            TokenRequest,
            TokenResponse,
            NamedItem,
            CreateRecipeRequest,
            UpdateRecipeRequest,
            PatchRecipeRequest,
            RecipeResponse,
            RecipeDetailResponse,
            RecipeImageResponse,
            RecipeImageUpload,
            TagResponse,
            UpdateTagRequest,
            PatchTagRequest,
            IngredientResponse,
            UpdateIngredientRequest,
            PatchIngredientRequest,
        )
    ),
    modifiers(&TokenAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Account registration, tokens and profile"),
        (name = "recipes", description = "Recipe management"),
        (name = "tags", description = "Recipe tags"),
        (name = "ingredients", description = "Recipe ingredients"),
    ),
    info(
        title = "Recipebook API",
        description = "Recipe management backend with per-user recipes, tags and ingredients",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
