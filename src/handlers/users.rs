use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::{auth_token, user};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AuthUser;
use crate::extract::ValidatedJson;
use crate::schemas::{
    api_error, bad_request, database_error, unique_or_database_error, ApiError, ApiResponse, AppState,
};

const DUPLICATE_EMAIL: &str = "user with this email already exists.";
const BAD_CREDENTIALS: &str = "Unable to authenticate with provided credentials.";

/// Request body for registering a user, also used for full profile replacement
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Login email address (must be unique)
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    /// Raw password, never returned
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    #[schema(write_only, format = Password)]
    pub password: String,
    /// Display name
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Request body for a partial profile update
#[derive(Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    #[schema(write_only, format = Password)]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Public view of a user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            email: model.email,
            name: model.name,
        }
    }
}

/// Credentials exchanged for an auth token
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct TokenRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[schema(write_only, format = Password)]
    pub password: String,
}

/// Issued auth token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Send as `Authorization: Token <token>`
    pub token: String,
}

fn user_store_error(err: user::UserError) -> ApiError {
    match err {
        user::UserError::MissingEmail => bad_request("VALIDATION_ERROR", "User must have an email address"),
        user::UserError::PasswordHash(message) => {
            error!("Password hashing failed: {}", message);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "PASSWORD_HASH_ERROR", "Failed to store password")
        }
        user::UserError::Database(e) => unique_or_database_error("Failed to save user", DUPLICATE_EMAIL, e),
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserApiResponse),
        (status = 400, description = "Invalid request or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering create_user function");

    let new_user = user::NewUser {
        email: request.email,
        password: request.password,
        name: request.name,
    };

    let created = user::create_user(&state.db, new_user)
        .await
        .map_err(user_store_error)?;

    info!("User created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserResponse::from(created), "User created successfully")),
    ))
}

/// Exchange email and password for an auth token
#[utoipa::path(
    post,
    path = "/api/v1/users/token",
    tag = "users",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenApiResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TokenRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>), ApiError> {
    trace!("Entering create_token function");

    let found = user::find_by_email(&state.db, &request.email)
        .await
        .map_err(|e| database_error("Failed to look up user", e))?;

    let account = match found {
        Some(account) if account.is_active && account.check_password(&request.password) => account,
        Some(_) => {
            warn!("Rejected credentials for existing user");
            return Err(bad_request("AUTHENTICATION_FAILED", BAD_CREDENTIALS));
        }
        None => {
            warn!("Token requested for unknown email");
            return Err(bad_request("AUTHENTICATION_FAILED", BAD_CREDENTIALS));
        }
    };

    let token = auth_token::get_or_create_for_user(&state.db, account.id)
        .await
        .map_err(|e| database_error("Failed to issue token", e))?;
    state.token_cache.insert(token.key.clone(), account.id).await;

    info!("Issued token for user {}", account.id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::new(TokenResponse { token: token.key }, "Token issued successfully")),
    ))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "User retrieved successfully", body = UserApiResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(user))]
pub async fn get_me(AuthUser(user): AuthUser) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    debug!("Returning profile of user {}", user.id);
    Ok(Json(ApiResponse::new(UserResponse::from(user), "User retrieved successfully")))
}

/// Replace the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserApiResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, request))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let changes = UpdateUserRequest {
        email: Some(request.email),
        password: Some(request.password),
        name: Some(request.name),
    };
    apply_user_update(&state, user, changes).await
}

/// Partially update the authenticated user's profile
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserApiResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, request))]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    apply_user_update(&state, user, request).await
}

async fn apply_user_update(
    state: &AppState,
    current: user::Model,
    request: UpdateUserRequest,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_id = current.id;
    debug!("Updating profile of user {}", user_id);

    let mut active: user::ActiveModel = current.into();
    if let Some(email) = request.email {
        active.email = Set(user::normalize_email(&email));
    }
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(password) = request.password {
        trace!("Re-hashing password of user {}", user_id);
        active.password = Set(user::hash_password(&password).map_err(user_store_error)?);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| unique_or_database_error("Failed to update user", DUPLICATE_EMAIL, e))?;

    info!("User {} updated successfully", user_id);
    Ok(Json(ApiResponse::new(UserResponse::from(updated), "User updated successfully")))
}
