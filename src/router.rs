use crate::handlers::{
    health::health_check,
    ingredients::{delete_ingredient, get_ingredient, get_ingredients, patch_ingredient, update_ingredient},
    recipes::{
        create_recipe, delete_recipe, get_recipe, get_recipes, patch_recipe, update_recipe, upload_recipe_image,
    },
    tags::{delete_tag, get_tag, get_tags, patch_tag, update_tag},
    users::{create_token, create_user, get_me, patch_me, update_me},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// URL prefix uploaded files are served under.
pub const MEDIA_URL: &str = "/media";

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.media_root);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Accounts and tokens
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/token", post(create_token))
        .route("/api/v1/users/me", get(get_me).put(update_me).patch(patch_me))
        // Recipes
        .route("/api/v1/recipes", get(get_recipes).post(create_recipe))
        .route(
            "/api/v1/recipes/:recipe_id",
            get(get_recipe)
                .put(update_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/api/v1/recipes/:recipe_id/upload-image",
            post(upload_recipe_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Tags
        .route("/api/v1/tags", get(get_tags))
        .route(
            "/api/v1/tags/:tag_id",
            get(get_tag).put(update_tag).patch(patch_tag).delete(delete_tag),
        )
        // Ingredients
        .route("/api/v1/ingredients", get(get_ingredients))
        .route(
            "/api/v1/ingredients/:ingredient_id",
            get(get_ingredient)
                .put(update_ingredient)
                .patch(patch_ingredient)
                .delete(delete_ingredient),
        )
        // Uploaded media
        .nest_service(MEDIA_URL, media)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
