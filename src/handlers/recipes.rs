use std::path::PathBuf;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use compute::associations::{set_recipe_ingredients, set_recipe_tags};
use model::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Query as SeaQuery, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, LoaderTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::auth::AuthUser;
use crate::extract::ValidatedJson;
use crate::handlers::ingredients::IngredientResponse;
use crate::handlers::tags::TagResponse;
use crate::router::MEDIA_URL;
use crate::schemas::{
    api_error, bad_request, compute_error, database_error, not_found, ApiError, ApiResponse, AppState,
};

/// Multipart field carrying the uploaded image.
const IMAGE_FIELD: &str = "image";

/// A tag or ingredient referenced by name inside a recipe payload
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NamedItem {
    pub name: String,
}

impl NamedItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn names(items: &[NamedItem]) -> Vec<String> {
    items.iter().map(|item| item.name.clone()).collect()
}

fn price_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Prices are stored as `decimal(5, 2)`.
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.normalize().scale() > 2 {
        return Err(price_error(
            "max_decimal_places",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    if price.abs() >= Decimal::ONE_THOUSAND {
        return Err(price_error(
            "max_digits",
            "Ensure that there are no more than 5 digits in total.",
        ));
    }
    Ok(())
}

/// Request body for creating a recipe
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateRecipeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 0))]
    pub time_minutes: i32,
    /// Decimal string such as `"5.50"`
    #[validate(custom(function = validate_price))]
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub link: String,
    /// Tags by name, created for the user when missing
    pub tags: Option<Vec<NamedItem>>,
    /// Ingredients by name, created for the user when missing
    pub ingredients: Option<Vec<NamedItem>>,
}

/// Request body for replacing a recipe
///
/// Omitted `description`, `link`, `tags` or `ingredients` keep their current value.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateRecipeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 0))]
    pub time_minutes: i32,
    #[validate(custom(function = validate_price))]
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
    pub tags: Option<Vec<NamedItem>>,
    pub ingredients: Option<Vec<NamedItem>>,
}

/// Request body for a partial recipe update
///
/// `tags: []` detaches every tag; omitting `tags` leaves them alone.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct PatchRecipeRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(range(min = 0))]
    pub time_minutes: Option<i32>,
    #[validate(custom(function = validate_price))]
    #[schema(value_type = Option<String>, example = "5.50")]
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
    pub tags: Option<Vec<NamedItem>>,
    pub ingredients: Option<Vec<NamedItem>>,
}

impl From<UpdateRecipeRequest> for PatchRecipeRequest {
    fn from(request: UpdateRecipeRequest) -> Self {
        Self {
            title: Some(request.title),
            time_minutes: Some(request.time_minutes),
            price: Some(request.price),
            description: request.description,
            link: request.link,
            tags: request.tags,
            ingredients: request.ingredients,
        }
    }
}

/// Recipe as shown in listings
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
}

/// Recipe with description and image URL
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[schema(value_type = String, example = "5.50")]
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
    pub description: String,
    /// URL of the uploaded image, if any
    pub image: Option<String>,
}

/// Multipart form accepted by the image upload
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct RecipeImageUpload {
    /// The image file
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Result of an image upload
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i32,
    pub image: Option<String>,
}

/// Two decimal places, matching the column definition.
fn display_price(price: Decimal) -> Decimal {
    let mut price = price;
    price.rescale(2);
    price
}

fn image_url(image: Option<&str>) -> Option<String> {
    image.map(|path| format!("{}/{}", MEDIA_URL, path))
}

impl RecipeResponse {
    fn new(model: recipe::Model, tags: Vec<tag::Model>, ingredients: Vec<ingredient::Model>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            time_minutes: model.time_minutes,
            price: display_price(model.price),
            link: model.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        }
    }
}

impl RecipeDetailResponse {
    fn new(model: recipe::Model, tags: Vec<tag::Model>, ingredients: Vec<ingredient::Model>) -> Self {
        Self {
            id: model.id,
            image: image_url(model.image.as_deref()),
            description: model.description,
            title: model.title,
            time_minutes: model.time_minutes,
            price: display_price(model.price),
            link: model.link,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        }
    }
}

/// Query parameters for listing recipes
#[derive(Debug, Default, Deserialize, Serialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct RecipeListQuery {
    /// Comma separated tag ids; recipes with any of them match
    pub tags: Option<String>,
    /// Comma separated ingredient ids; recipes with any of them match
    pub ingredients: Option<String>,
}

/// Parses `"1,2,3"` into ids.
fn parse_ids(raw: &str, param: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>().map_err(|_| {
                warn!("Invalid id '{}' in '{}' filter", part, param);
                bad_request("INVALID_FILTER", format!("{}: '{}' is not a valid id", param, part))
            })
        })
        .collect()
}

async fn find_owned_recipe(state: &AppState, user_id: i32, recipe_id: i32) -> Result<recipe::Model, ApiError> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch recipe", e))?
        .ok_or_else(|| {
            warn!("Recipe {} not found for user {}", recipe_id, user_id);
            not_found("Recipe")
        })
}

async fn load_detail<C: ConnectionTrait>(db: &C, model: recipe::Model) -> Result<RecipeDetailResponse, DbErr> {
    let tags = model
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;
    let ingredients = model
        .find_related(ingredient::Entity)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;
    Ok(RecipeDetailResponse::new(model, tags, ingredients))
}

/// Applies the association part of a payload. `None` leaves the set alone.
async fn write_associations<C: ConnectionTrait>(
    db: &C,
    model: &recipe::Model,
    tags: Option<Vec<NamedItem>>,
    ingredients: Option<Vec<NamedItem>>,
) -> Result<(), ApiError> {
    if let Some(tags) = tags {
        set_recipe_tags(db, model, &names(&tags))
            .await
            .map_err(|e| compute_error("Failed to update recipe tags", e))?;
    }
    if let Some(ingredients) = ingredients {
        set_recipe_ingredients(db, model, &names(&ingredients))
            .await
            .map_err(|e| compute_error("Failed to update recipe ingredients", e))?;
    }
    Ok(())
}

/// List the authenticated user's recipes, newest first
#[utoipa::path(
    get,
    path = "/api/v1/recipes",
    tag = "recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Recipes retrieved successfully", body = RecipeListApiResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Valid(Query(query)): Valid<Query<RecipeListQuery>>,
) -> Result<Json<ApiResponse<Vec<RecipeResponse>>>, ApiError> {
    trace!("Entering get_recipes function");

    let mut select = recipe::Entity::find().filter(recipe::Column::UserId.eq(user.id));

    if let Some(raw) = query.tags.as_deref() {
        let tag_ids = parse_ids(raw, "tags")?;
        debug!("Filtering recipes by tags {:?}", tag_ids);
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_tag::Column::RecipeId)
                    .from(recipe_tag::Entity)
                    .and_where(recipe_tag::Column::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }
    if let Some(raw) = query.ingredients.as_deref() {
        let ingredient_ids = parse_ids(raw, "ingredients")?;
        debug!("Filtering recipes by ingredients {:?}", ingredient_ids);
        select = select.filter(
            recipe::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(recipe_ingredient::Column::RecipeId)
                    .from(recipe_ingredient::Entity)
                    .and_where(recipe_ingredient::Column::IngredientId.is_in(ingredient_ids))
                    .to_owned(),
            ),
        );
    }

    let recipes = select
        .order_by_desc(recipe::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to fetch recipes", e))?;

    let tags = recipes
        .load_many_to_many(tag::Entity, recipe_tag::Entity, &state.db)
        .await
        .map_err(|e| database_error("Failed to fetch recipe tags", e))?;
    let ingredients = recipes
        .load_many_to_many(ingredient::Entity, recipe_ingredient::Entity, &state.db)
        .await
        .map_err(|e| database_error("Failed to fetch recipe ingredients", e))?;

    let data: Vec<RecipeResponse> = recipes
        .into_iter()
        .zip(tags)
        .zip(ingredients)
        .map(|((model, mut tags), mut ingredients)| {
            tags.sort_by_key(|t| t.id);
            ingredients.sort_by_key(|i| i.id);
            RecipeResponse::new(model, tags, ingredients)
        })
        .collect();

    info!("Retrieved {} recipes for user {}", data.len(), user.id);
    Ok(Json(ApiResponse::new(data, "Recipes retrieved successfully")))
}

/// Create a recipe, attaching tags and ingredients by name
#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeDetailApiResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, request), fields(title = %request.title))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDetailResponse>>), ApiError> {
    trace!("Entering create_recipe function");

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let created = recipe::ActiveModel {
        user_id: Set(user.id),
        title: Set(request.title),
        time_minutes: Set(request.time_minutes),
        price: Set(request.price),
        description: Set(request.description),
        link: Set(request.link),
        image: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| database_error("Failed to create recipe", e))?;

    write_associations(&txn, &created, request.tags, request.ingredients).await?;

    txn.commit()
        .await
        .map_err(|e| database_error("Failed to commit recipe", e))?;

    let recipe_id = created.id;
    let detail = load_detail(&state.db, created)
        .await
        .map_err(|e| database_error("Failed to load recipe", e))?;

    info!("Recipe {} created for user {}", recipe_id, user.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(detail, "Recipe created successfully")),
    ))
}

/// Get one of the authenticated user's recipes
#[utoipa::path(
    get,
    path = "/api/v1/recipes/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe retrieved successfully", body = RecipeDetailApiResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn get_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<RecipeDetailResponse>>, ApiError> {
    let found = find_owned_recipe(&state, user.id, recipe_id).await?;
    let detail = load_detail(&state.db, found)
        .await
        .map_err(|e| database_error("Failed to load recipe", e))?;

    debug!("Returning recipe {}", recipe_id);
    Ok(Json(ApiResponse::new(detail, "Recipe retrieved successfully")))
}

/// Replace a recipe
#[utoipa::path(
    put,
    path = "/api/v1/recipes/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeDetailApiResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, request))]
pub async fn update_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<UpdateRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDetailResponse>>, ApiError> {
    let existing = find_owned_recipe(&state, user.id, recipe_id).await?;
    apply_recipe_changes(&state, existing, request.into()).await
}

/// Partially update a recipe
#[utoipa::path(
    patch,
    path = "/api/v1/recipes/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    request_body = PatchRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeDetailApiResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, request))]
pub async fn patch_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(request): ValidatedJson<PatchRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDetailResponse>>, ApiError> {
    let existing = find_owned_recipe(&state, user.id, recipe_id).await?;
    apply_recipe_changes(&state, existing, request).await
}

async fn apply_recipe_changes(
    state: &AppState,
    existing: recipe::Model,
    changes: PatchRecipeRequest,
) -> Result<Json<ApiResponse<RecipeDetailResponse>>, ApiError> {
    let recipe_id = existing.id;
    debug!("Updating recipe {}", recipe_id);

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let mut active: recipe::ActiveModel = existing.clone().into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(link) = changes.link {
        active.link = Set(link);
    }

    let updated = if active.is_changed() {
        active
            .update(&txn)
            .await
            .map_err(|e| database_error("Failed to update recipe", e))?
    } else {
        trace!("No column changes for recipe {}", recipe_id);
        existing
    };

    write_associations(&txn, &updated, changes.tags, changes.ingredients).await?;

    txn.commit()
        .await
        .map_err(|e| database_error("Failed to commit recipe", e))?;

    let detail = load_detail(&state.db, updated)
        .await
        .map_err(|e| database_error("Failed to load recipe", e))?;

    info!("Recipe {} updated successfully", recipe_id);
    Ok(Json(ApiResponse::new(detail, "Recipe updated successfully")))
}

/// Delete a recipe and its tag/ingredient links
#[utoipa::path(
    delete,
    path = "/api/v1/recipes/{recipe_id}",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user))]
pub async fn delete_recipe(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    let existing = find_owned_recipe(&state, user.id, recipe_id).await?;

    recipe::Entity::delete_by_id(existing.id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete recipe", e))?;

    if let Some(image) = existing.image.as_deref() {
        remove_media_file(&state, image).await;
    }

    info!("Recipe {} deleted", recipe_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_media_file(state: &AppState, relative: &str) {
    let path = state.media_root.join(relative);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Could not remove media file {}: {}", path.display(), e);
    }
}

/// Accepts the part when both its declared content type and its file
/// extension say it is an image.
fn is_image(file_name: &str, content_type: Option<&str>) -> bool {
    let declared_ok = content_type.map_or(true, |ct| ct.starts_with("image/"));
    let guessed_ok = mime_guess::from_path(file_name)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
    declared_ok && guessed_ok
}

/// Upload an image for a recipe
#[utoipa::path(
    post,
    path = "/api/v1/recipes/{recipe_id}/upload-image",
    tag = "recipes",
    params(("recipe_id" = i32, Path, description = "Recipe ID")),
    request_body(content = RecipeImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded", body = RecipeImageApiResponse),
        (status = 400, description = "Missing or invalid image", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("token_auth" = []))
)]
#[instrument(skip(state, user, multipart))]
pub async fn upload_recipe_image(
    Path(recipe_id): Path<i32>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<RecipeImageResponse>>, ApiError> {
    let existing = find_owned_recipe(&state, user.id, recipe_id).await?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        bad_request("INVALID_BODY", e.body_text())
    })? {
        if field.name() != Some(IMAGE_FIELD) {
            trace!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_string) else {
            warn!("Image field is not a file");
            return Err(bad_request(
                "INVALID_IMAGE",
                "image: The submitted data was not a file. Check the encoding type on the form.",
            ));
        };
        if !is_image(&file_name, field.content_type()) {
            warn!("Rejected non-image upload '{}' ({:?})", file_name, field.content_type());
            return Err(bad_request(
                "INVALID_IMAGE",
                "image: Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            ));
        }

        let data = field.bytes().await.map_err(|e| {
            warn!("Failed to read image body: {}", e);
            bad_request("INVALID_BODY", e.body_text())
        })?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) = upload.ok_or_else(|| {
        warn!("Upload without image field");
        bad_request("INVALID_IMAGE", "image: No file was submitted.")
    })?;
    if data.is_empty() {
        return Err(bad_request("INVALID_IMAGE", "image: The submitted file is empty."));
    }

    let relative = recipe::image_upload_path(&file_name);
    let full_path: PathBuf = state.media_root.join(&relative);
    debug!("Storing {} bytes at {}", data.len(), full_path.display());

    let storage_error = |e: std::io::Error| {
        error!("Failed to store image at {}: {}", full_path.display(), e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "Failed to store image")
    };
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
    }
    tokio::fs::write(&full_path, &data).await.map_err(storage_error)?;

    let previous = existing.image.clone();
    let mut active: recipe::ActiveModel = existing.into();
    active.image = Set(Some(relative.clone()));
    let updated = match active.update(&state.db).await {
        Ok(updated) => updated,
        Err(e) => {
            remove_media_file(&state, &relative).await;
            return Err(database_error("Failed to save recipe image", e));
        }
    };

    if let Some(previous) = previous.as_deref() {
        remove_media_file(&state, previous).await;
    }

    info!("Image uploaded for recipe {}", recipe_id);
    Ok(Json(ApiResponse::new(
        RecipeImageResponse {
            id: updated.id,
            image: image_url(updated.image.as_deref()),
        },
        "Image uploaded successfully",
    )))
}
