use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use model::entities::{auth_token, ingredient, recipe, recipe_tag, tag, user};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

use crate::handlers::recipes::{CreateRecipeRequest, NamedItem, PatchRecipeRequest, RecipeDetailResponse, RecipeResponse};
use crate::handlers::users::{CreateUserRequest, TokenRequest, TokenResponse, UserResponse};
use crate::schemas::{ApiResponse, ErrorResponse, HealthResponse};
use crate::test_utils::{insert_user, setup_test_app, TestApp};

const RECIPES_URL: &str = "/api/v1/recipes";
const TAGS_URL: &str = "/api/v1/tags";
const INGREDIENTS_URL: &str = "/api/v1/ingredients";

fn recipe_url(id: i32) -> String {
    format!("{}/{}", RECIPES_URL, id)
}

fn image_upload_url(id: i32) -> String {
    format!("{}/{}/upload-image", RECIPES_URL, id)
}

/// 1x1 transparent PNG
const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
    0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D,
    0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn sample_recipe_request() -> CreateRecipeRequest {
    CreateRecipeRequest {
        title: "Sample recipe".to_string(),
        time_minutes: 30,
        price: "5.99".parse().unwrap(),
        description: String::new(),
        link: String::new(),
        tags: None,
        ingredients: None,
    }
}

fn png_form() -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(PNG_PIXEL.to_vec())
            .file_name("pixel.png")
            .mime_type("image/png"),
    )
}

/// Uploads the test PNG and returns the stored path relative to the media root.
async fn upload_png(app: &TestApp, recipe_id: i32) -> String {
    app.post(&image_upload_url(recipe_id))
        .multipart(png_form())
        .await
        .assert_status(StatusCode::OK);
    recipe::Entity::find_by_id(recipe_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap()
        .image
        .expect("image path stored")
}

fn tag_names(detail: &RecipeDetailResponse) -> Vec<&str> {
    detail.tags.iter().map(|t| t.name.as_str()).collect()
}

fn ingredient_names(detail: &RecipeDetailResponse) -> Vec<&str> {
    detail.ingredients.iter().map(|i| i.name.as_str()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "healthy");
    assert_eq!(body.database, "connected");
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_user_success() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&CreateUserRequest {
            email: "test@example.com".to_string(),
            password: "testpass123".to_string(),
            name: "Test Name".to_string(),
        })
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<Value> = response.json();
    assert!(body.success);
    assert_eq!(body.message, "User created successfully");
    assert_eq!(body.data["email"], "test@example.com");
    assert!(body.data.get("password").is_none());

    let stored = user::find_by_email(&app.db, "test@example.com").await.unwrap().unwrap();
    assert!(stored.check_password("testpass123"));
}

#[tokio::test]
async fn test_user_with_email_exists_error() {
    let app = setup_test_app().await;
    insert_user(&app.db, "test@example.com").await;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({"email": "test@example.com", "password": "testpass123", "name": "Test"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert!(!body.success);
    assert_eq!(body.code, "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_password_too_short_error() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/v1/users")
        .json(&json!({"email": "short@example.com", "password": "pw", "name": "Test"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let exists = user::find_by_email(&app.db, "short@example.com").await.unwrap();
    assert!(exists.is_none());
}

#[tokio::test]
async fn test_create_token_for_user() {
    let app = setup_test_app().await;
    user::create_user(
        &app.db,
        user::NewUser {
            email: "test@example.com".to_string(),
            password: "test-user-password123".to_string(),
            name: "Test Name".to_string(),
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .post("/api/v1/users/token")
        .json(&TokenRequest {
            email: "test@EXAMPLE.com".to_string(),
            password: "test-user-password123".to_string(),
        })
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<TokenResponse> = response.json();
    assert_eq!(body.data.token.len(), 40);

    // The issued token authenticates
    let me = app
        .server
        .get("/api/v1/users/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_str(&format!("Token {}", body.data.token)).unwrap(),
        )
        .await;
    me.assert_status(StatusCode::OK);
    let profile: ApiResponse<UserResponse> = me.json();
    assert_eq!(profile.data.email, "test@example.com");
}

#[tokio::test]
async fn test_create_token_bad_credentials() {
    let app = setup_test_app().await;
    user::create_user(
        &app.db,
        user::NewUser {
            email: "test@example.com".to_string(),
            password: "goodpass123".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let response = app
        .server
        .post("/api/v1/users/token")
        .json(&json!({"email": "test@example.com", "password": "badpass"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Unable to authenticate with provided credentials.");
}

#[tokio::test]
async fn test_create_token_blank_password() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/api/v1/users/token")
        .json(&json!({"email": "test@example.com", "password": ""}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_retrieve_user_unauthorized() {
    let app = setup_test_app().await;

    let response = app.server.get("/api/v1/users/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_unauthorized() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/api/v1/users/me")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("Token not-a-real-token"),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_profile_success() {
    let app = setup_test_app().await;

    let response = app.get("/api/v1/users/me").await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<UserResponse> = response.json();
    assert_eq!(body.data.email, app.user.email);
    assert_eq!(body.data.name, app.user.name);
}

#[tokio::test]
async fn test_post_me_not_allowed() {
    let app = setup_test_app().await;

    let response = app.post("/api/v1/users/me").json(&json!({})).await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_update_user_profile() {
    let app = setup_test_app().await;

    let response = app
        .patch("/api/v1/users/me")
        .json(&json!({"name": "Updated name", "password": "newpassword123"}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<UserResponse> = response.json();
    assert_eq!(body.data.name, "Updated name");

    let stored = user::Entity::find_by_id(app.user.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.name, "Updated name");
    assert!(stored.check_password("newpassword123"));
}

#[tokio::test]
async fn test_inactive_user_rejected() {
    let app = setup_test_app().await;
    let mut active: user::ActiveModel = app.user.clone().into();
    active.is_active = sea_orm::Set(false);
    sea_orm::ActiveModelTrait::update(active, &app.db).await.unwrap();

    let response = app.get("/api/v1/users/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_recipes_auth_required() {
    let app = setup_test_app().await;

    let response = app.server.get(RECIPES_URL).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_retrieve_recipes() {
    let app = setup_test_app().await;
    let first = app.create_recipe(app.user.id, "First").await;
    let second = app.create_recipe(app.user.id, "Second").await;

    let response = app.get(RECIPES_URL).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<RecipeResponse>> = response.json();
    let ids: Vec<i32> = body.data.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(body.data[0].price.to_string(), "5.25");
}

#[tokio::test]
async fn test_retrieve_recipes_limited_to_user() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    app.create_recipe(other.id, "Not mine").await;
    let mine = app.create_recipe(app.user.id, "Mine").await;

    let response = app.get(RECIPES_URL).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<RecipeResponse>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0].id, mine.id);
}

#[tokio::test]
async fn test_list_view_omits_description() {
    let app = setup_test_app().await;
    app.create_recipe(app.user.id, "Soup").await;

    let response = app.get(RECIPES_URL).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert!(body.data[0].get("description").is_none());
    assert!(body.data[0].get("tags").is_some());
}

#[tokio::test]
async fn test_get_recipe_detail() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Detail").await;

    let response = app.get(&recipe_url(created.id)).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert_eq!(body.data.id, created.id);
    assert_eq!(body.data.description, "Sample description");
    assert_eq!(body.data.image, None);
}

#[tokio::test]
async fn test_get_other_user_recipe_not_found() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    let theirs = app.create_recipe(other.id, "Theirs").await;

    let response = app.get(&recipe_url(theirs.id)).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_recipe() {
    let app = setup_test_app().await;

    let response = app.post(RECIPES_URL).json(&sample_recipe_request()).await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    let stored = recipe::Entity::find_by_id(body.data.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "Sample recipe");
    assert_eq!(stored.time_minutes, 30);
    assert_eq!(stored.price.round_dp(2), "5.99".parse().unwrap());
    assert_eq!(stored.user_id, app.user.id);
    assert_eq!(body.data.price.to_string(), "5.99");
}

#[tokio::test]
async fn test_create_recipe_invalid_price() {
    let app = setup_test_app().await;

    let response = app
        .post(RECIPES_URL)
        .json(&json!({"title": "Too pricey", "time_minutes": 5, "price": "1000.00"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(recipe::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_recipe_malformed_body() {
    let app = setup_test_app().await;

    let response = app.post(RECIPES_URL).json(&json!({"title": "No price"})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_BODY");
}

#[tokio::test]
async fn test_partial_update_recipe() {
    let app = setup_test_app().await;
    let original = app.create_recipe(app.user.id, "Sample recipe title").await;

    let response = app
        .patch(&recipe_url(original.id))
        .json(&json!({"title": "New recipe title"}))
        .await;

    response.assert_status(StatusCode::OK);
    let stored = recipe::Entity::find_by_id(original.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "New recipe title");
    assert_eq!(stored.link, original.link);
    assert_eq!(stored.user_id, app.user.id);
}

#[tokio::test]
async fn test_full_update_recipe() {
    let app = setup_test_app().await;
    let original = app.create_recipe(app.user.id, "Sample recipe title").await;

    let response = app
        .put(&recipe_url(original.id))
        .json(&json!({
            "title": "New recipe title",
            "link": "https://example.com/new-recipe.pdf",
            "description": "New recipe description",
            "time_minutes": 10,
            "price": "2.50",
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let stored = recipe::Entity::find_by_id(original.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "New recipe title");
    assert_eq!(stored.link, "https://example.com/new-recipe.pdf");
    assert_eq!(stored.description, "New recipe description");
    assert_eq!(stored.time_minutes, 10);
    assert_eq!(stored.price.round_dp(2), "2.50".parse().unwrap());
}

#[tokio::test]
async fn test_update_other_user_recipe_not_found() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    let theirs = app.create_recipe(other.id, "Theirs").await;

    let response = app
        .patch(&recipe_url(theirs.id))
        .json(&json!({"title": "Hijacked"}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let stored = recipe::Entity::find_by_id(theirs.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "Theirs");
    assert_eq!(stored.user_id, other.id);
}

#[tokio::test]
async fn test_delete_recipe() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Doomed").await;

    let response = app.delete(&recipe_url(created.id)).await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(recipe::Entity::find_by_id(created.id).one(&app.db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_other_user_recipe_error() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    let theirs = app.create_recipe(other.id, "Theirs").await;

    let response = app.delete(&recipe_url(theirs.id)).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(recipe::Entity::find_by_id(theirs.id).one(&app.db).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_recipe_with_new_tags() {
    let app = setup_test_app().await;
    let request = CreateRecipeRequest {
        title: "Thai Prawn Curry".to_string(),
        tags: Some(vec![NamedItem::new("Thai"), NamedItem::new("Dinner")]),
        ..sample_recipe_request()
    };

    let response = app.post(RECIPES_URL).json(&request).await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert_eq!(body.data.tags.len(), 2);
    let created = recipe::Entity::find_by_id(body.data.id).one(&app.db).await.unwrap().unwrap();
    let tags = created.find_related(tag::Entity).all(&app.db).await.unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|t| t.user_id == app.user.id));
}

#[tokio::test]
async fn test_create_recipe_with_existing_tags() {
    let app = setup_test_app().await;
    let indian = app.create_tag(app.user.id, "Indian").await;
    let request = CreateRecipeRequest {
        title: "Pongal".to_string(),
        tags: Some(vec![NamedItem::new("Indian"), NamedItem::new("Breakfast")]),
        ..sample_recipe_request()
    };

    let response = app.post(RECIPES_URL).json(&request).await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert!(body.data.tags.iter().any(|t| t.id == indian.id));
    let count = tag::Entity::find()
        .filter(tag::Column::UserId.eq(app.user.id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_create_tag_on_update() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Toast").await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"tags": [{"name": "Lunch"}]}))
        .await;

    response.assert_status(StatusCode::OK);
    let lunch = tag::Entity::find()
        .filter(tag::Column::UserId.eq(app.user.id))
        .filter(tag::Column::Name.eq("Lunch"))
        .one(&app.db)
        .await
        .unwrap()
        .expect("tag created");
    let linked = created.find_related(tag::Entity).all(&app.db).await.unwrap();
    assert_eq!(linked, vec![lunch]);
}

#[tokio::test]
async fn test_update_recipe_assign_tag() {
    let app = setup_test_app().await;
    let breakfast = app.create_tag(app.user.id, "Breakfast").await;
    let created = app.create_recipe(app.user.id, "Eggs").await;
    app.attach_tag(created.id, breakfast.id).await;
    let lunch = app.create_tag(app.user.id, "Lunch").await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"tags": [{"name": "Lunch"}]}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert_eq!(tag_names(&body.data), vec!["Lunch"]);
    let linked = created.find_related(tag::Entity).all(&app.db).await.unwrap();
    assert_eq!(linked, vec![lunch]);
}

#[tokio::test]
async fn test_clear_recipe_tags() {
    let app = setup_test_app().await;
    let dessert = app.create_tag(app.user.id, "Dessert").await;
    let created = app.create_recipe(app.user.id, "Cake").await;
    app.attach_tag(created.id, dessert.id).await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&PatchRecipeRequest {
            tags: Some(vec![]),
            ..Default::default()
        })
        .await;

    response.assert_status(StatusCode::OK);
    let stored = recipe::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, created.title);
    assert_eq!(stored.find_related(tag::Entity).count(&app.db).await.unwrap(), 0);
    // The tag itself survives
    assert!(tag::Entity::find_by_id(dessert.id).one(&app.db).await.unwrap().is_some());
}

#[tokio::test]
async fn test_patch_without_tags_keeps_them() {
    let app = setup_test_app().await;
    let vegan = app.create_tag(app.user.id, "Vegan").await;
    let created = app.create_recipe(app.user.id, "Salad").await;
    app.attach_tag(created.id, vegan.id).await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"time_minutes": 5}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert_eq!(tag_names(&body.data), vec!["Vegan"]);
    assert_eq!(body.data.time_minutes, 5);
}

#[tokio::test]
async fn test_blank_tag_name_rolls_back() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Stew").await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"title": "Changed", "tags": [{"name": "   "}]}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let stored = recipe::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "Stew");
}

#[tokio::test]
async fn test_create_recipe_with_new_ingredients() {
    let app = setup_test_app().await;
    let request = CreateRecipeRequest {
        title: "Cauliflower Tacos".to_string(),
        ingredients: Some(vec![NamedItem::new("Cauliflower"), NamedItem::new("Salt")]),
        ..sample_recipe_request()
    };

    let response = app.post(RECIPES_URL).json(&request).await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    let mut names = ingredient_names(&body.data);
    names.sort();
    assert_eq!(names, vec!["Cauliflower", "Salt"]);
}

#[tokio::test]
async fn test_create_recipe_with_existing_ingredients() {
    let app = setup_test_app().await;
    let lemon = app.create_ingredient(app.user.id, "Lemon").await;
    let request = CreateRecipeRequest {
        title: "Vietnamese Soup".to_string(),
        ingredients: Some(vec![NamedItem::new("Lemon"), NamedItem::new("Fish Sauce")]),
        ..sample_recipe_request()
    };

    let response = app.post(RECIPES_URL).json(&request).await;

    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert!(body.data.ingredients.iter().any(|i| i.id == lemon.id));
    let count = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(app.user.id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_create_ingredient_on_update() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Limeade").await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"ingredients": [{"name": "Limes"}]}))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<RecipeDetailResponse> = response.json();
    assert_eq!(ingredient_names(&body.data), vec!["Limes"]);
}

#[tokio::test]
async fn test_update_recipe_assign_ingredient() {
    let app = setup_test_app().await;
    let pepper = app.create_ingredient(app.user.id, "Pepper").await;
    let created = app.create_recipe(app.user.id, "Steak").await;
    app.attach_ingredient(created.id, pepper.id).await;
    let chili = app.create_ingredient(app.user.id, "Chili").await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"ingredients": [{"name": "Chili"}]}))
        .await;

    response.assert_status(StatusCode::OK);
    let linked = created.find_related(ingredient::Entity).all(&app.db).await.unwrap();
    assert_eq!(linked, vec![chili]);
}

#[tokio::test]
async fn test_clear_recipe_ingredients() {
    let app = setup_test_app().await;
    let garlic = app.create_ingredient(app.user.id, "Garlic").await;
    let created = app.create_recipe(app.user.id, "Bread").await;
    app.attach_ingredient(created.id, garlic.id).await;

    let response = app
        .patch(&recipe_url(created.id))
        .json(&json!({"ingredients": []}))
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        created.find_related(ingredient::Entity).count(&app.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_filter_recipes_by_tags() {
    let app = setup_test_app().await;
    let curry = app.create_recipe(app.user.id, "Thai Vegetable Curry").await;
    let tahini = app.create_recipe(app.user.id, "Aubergine with Tahini").await;
    let plain = app.create_recipe(app.user.id, "Fish and chips").await;
    let vegan = app.create_tag(app.user.id, "Vegan").await;
    let vegetarian = app.create_tag(app.user.id, "Vegetarian").await;
    app.attach_tag(curry.id, vegan.id).await;
    app.attach_tag(tahini.id, vegetarian.id).await;

    let response = app
        .get(&format!("{}?tags={},{}", RECIPES_URL, vegan.id, vegetarian.id))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<RecipeResponse>> = response.json();
    let ids: Vec<i32> = body.data.iter().map(|r| r.id).collect();
    assert!(ids.contains(&curry.id));
    assert!(ids.contains(&tahini.id));
    assert!(!ids.contains(&plain.id));
}

#[tokio::test]
async fn test_filter_recipes_by_ingredients() {
    let app = setup_test_app().await;
    let posh = app.create_recipe(app.user.id, "Posh Beans on Toast").await;
    let plain = app.create_recipe(app.user.id, "Red Lentil Daal").await;
    let feta = app.create_ingredient(app.user.id, "Feta Cheese").await;
    app.attach_ingredient(posh.id, feta.id).await;

    let response = app
        .get(&format!("{}?ingredients={}", RECIPES_URL, feta.id))
        .await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<RecipeResponse>> = response.json();
    let ids: Vec<i32> = body.data.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![posh.id]);
    assert!(!ids.contains(&plain.id));
}

#[tokio::test]
async fn test_filter_recipes_invalid_id() {
    let app = setup_test_app().await;

    let response = app.get(&format!("{}?tags=abc", RECIPES_URL)).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_image() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Photogenic").await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(PNG_PIXEL.to_vec())
            .file_name("pixel.png")
            .mime_type("image/png"),
    );
    let response = app.post(&image_upload_url(created.id)).multipart(form).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Value> = response.json();
    let url = body.data["image"].as_str().expect("image url").to_string();
    assert!(url.starts_with("/media/uploads/recipe/"));
    assert!(url.ends_with(".png"));

    let stored = recipe::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    let relative = stored.image.expect("image path stored");
    assert!(app.media_dir.path().join(&relative).exists());

    let served = app.server.get(&url).await;
    served.assert_status(StatusCode::OK);
    assert_eq!(served.as_bytes().as_ref(), PNG_PIXEL);
}

#[tokio::test]
async fn test_upload_image_bad_request() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Blurry").await;

    let form = MultipartForm::new().add_text("image", "notanimage");
    let response = app.post(&image_upload_url(created.id)).multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let stored = recipe::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    assert!(stored.image.is_none());
}

#[tokio::test]
async fn test_upload_non_image_file_rejected() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Text").await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(b"just some notes".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain"),
    );
    let response = app.post(&image_upload_url(created.id)).multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_image_other_user_recipe() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    let theirs = app.create_recipe(other.id, "Theirs").await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(PNG_PIXEL.to_vec())
            .file_name("pixel.png")
            .mime_type("image/png"),
    );
    let response = app.post(&image_upload_url(theirs.id)).multipart(form).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_image_replaces_previous_file() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Twice").await;

    let first = upload_png(&app, created.id).await;
    let second = upload_png(&app, created.id).await;

    assert_ne!(first, second);
    assert!(!app.media_dir.path().join(&first).exists());
    assert!(app.media_dir.path().join(&second).exists());
}

#[tokio::test]
async fn test_delete_recipe_removes_image_file() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Short lived").await;
    let stored = upload_png(&app, created.id).await;
    assert!(app.media_dir.path().join(&stored).exists());

    app.delete(&recipe_url(created.id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(!app.media_dir.path().join(&stored).exists());
}

#[tokio::test]
async fn test_upload_image_failed_save_leaves_no_file() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Locked").await;
    app.db
        .execute_unprepared(
            "CREATE TRIGGER reject_image BEFORE UPDATE OF image ON recipes \
             BEGIN SELECT RAISE(ABORT, 'image updates disabled'); END;",
        )
        .await
        .unwrap();

    let response = app.post(&image_upload_url(created.id)).multipart(png_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let upload_dir = app.media_dir.path().join(recipe::IMAGE_UPLOAD_DIR);
    let leftovers = std::fs::read_dir(&upload_dir).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_list_and_detail_order_associations_by_id() {
    let app = setup_test_app().await;
    let created = app.create_recipe(app.user.id, "Ordered").await;
    let first_tag = app.create_tag(app.user.id, "Zesty").await;
    let second_tag = app.create_tag(app.user.id, "Autumn").await;
    let first_ingredient = app.create_ingredient(app.user.id, "Thyme").await;
    let second_ingredient = app.create_ingredient(app.user.id, "Butter").await;
    // Link rows in reverse id order
    app.attach_tag(created.id, second_tag.id).await;
    app.attach_tag(created.id, first_tag.id).await;
    app.attach_ingredient(created.id, second_ingredient.id).await;
    app.attach_ingredient(created.id, first_ingredient.id).await;

    let list: ApiResponse<Vec<RecipeResponse>> = app.get(RECIPES_URL).await.json();
    let detail: ApiResponse<RecipeDetailResponse> = app.get(&recipe_url(created.id)).await.json();

    let expected_tags = vec![first_tag.id, second_tag.id];
    let expected_ingredients = vec![first_ingredient.id, second_ingredient.id];
    let list_tags: Vec<i32> = list.data[0].tags.iter().map(|t| t.id).collect();
    let list_ingredients: Vec<i32> = list.data[0].ingredients.iter().map(|i| i.id).collect();
    let detail_tags: Vec<i32> = detail.data.tags.iter().map(|t| t.id).collect();
    let detail_ingredients: Vec<i32> = detail.data.ingredients.iter().map(|i| i.id).collect();
    assert_eq!(list_tags, expected_tags);
    assert_eq!(detail_tags, expected_tags);
    assert_eq!(list_ingredients, expected_ingredients);
    assert_eq!(detail_ingredients, expected_ingredients);
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tags_login_required() {
    let app = setup_test_app().await;

    let response = app.server.get(TAGS_URL).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_tags() {
    let app = setup_test_app().await;
    app.create_tag(app.user.id, "Vegan").await;
    app.create_tag(app.user.id, "Dessert").await;

    let response = app.get(TAGS_URL).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<Value>> = response.json();
    let names: Vec<&str> = body.data.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Vegan", "Dessert"]);
}

#[tokio::test]
async fn test_tags_limited_to_user() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    app.create_tag(other.id, "Fruity").await;
    let mine = app.create_tag(app.user.id, "Comfort Food").await;

    let response = app.get(TAGS_URL).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0]["name"], "Comfort Food");
    assert_eq!(body.data[0]["id"], mine.id);
}

#[tokio::test]
async fn test_update_tag() {
    let app = setup_test_app().await;
    let created = app.create_tag(app.user.id, "After Dinner").await;

    let response = app
        .patch(&format!("{}/{}", TAGS_URL, created.id))
        .json(&json!({"name": "Dessert"}))
        .await;

    response.assert_status(StatusCode::OK);
    let stored = tag::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.name, "Dessert");
}

#[tokio::test]
async fn test_rename_tag_to_existing_name() {
    let app = setup_test_app().await;
    app.create_tag(app.user.id, "Dinner").await;
    let lunch = app.create_tag(app.user.id, "Lunch").await;

    let response = app
        .put(&format!("{}/{}", TAGS_URL, lunch.id))
        .json(&json!({"name": "Dinner"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_delete_tag() {
    let app = setup_test_app().await;
    let created = app.create_tag(app.user.id, "Breakfast").await;
    let eggs = app.create_recipe(app.user.id, "Eggs").await;
    app.attach_tag(eggs.id, created.id).await;

    let response = app.delete(&format!("{}/{}", TAGS_URL, created.id)).await;

    response.assert_status(StatusCode::NO_CONTENT);
    let remaining = tag::Entity::find()
        .filter(tag::Column::UserId.eq(app.user.id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    let links = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.eq(eggs.id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(links, 0);
}

#[tokio::test]
async fn test_delete_other_user_tag_not_found() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    let theirs = app.create_tag(other.id, "Theirs").await;

    let response = app.delete(&format!("{}/{}", TAGS_URL, theirs.id)).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(tag::Entity::find_by_id(theirs.id).one(&app.db).await.unwrap().is_some());
}

#[tokio::test]
async fn test_filter_tags_assigned_to_recipes() {
    let app = setup_test_app().await;
    let breakfast = app.create_tag(app.user.id, "Breakfast").await;
    app.create_tag(app.user.id, "Dinner").await;
    let curry = app.create_recipe(app.user.id, "Spicy Curry").await;
    app.attach_tag(curry.id, breakfast.id).await;

    let response = app.get(&format!("{}?assigned_only=1", TAGS_URL)).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0]["name"], "Breakfast");
}

#[tokio::test]
async fn test_filtered_tags_unique() {
    let app = setup_test_app().await;
    let cumin = app.create_tag(app.user.id, "Cumin").await;
    app.create_tag(app.user.id, "Coriander").await;
    let curry = app.create_recipe(app.user.id, "Spicy Curry").await;
    let daal = app.create_recipe(app.user.id, "Daal").await;
    app.attach_tag(curry.id, cumin.id).await;
    app.attach_tag(daal.id, cumin.id).await;

    let response = app.get(&format!("{}?assigned_only=1", TAGS_URL)).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
}

#[tokio::test]
async fn test_assigned_only_out_of_range() {
    let app = setup_test_app().await;

    let response = app.get(&format!("{}?assigned_only=5", TAGS_URL)).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_ingredients_login_required() {
    let app = setup_test_app().await;

    let response = app.server.get(INGREDIENTS_URL).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_ingredients() {
    let app = setup_test_app().await;
    app.create_ingredient(app.user.id, "Kale").await;
    app.create_ingredient(app.user.id, "Vanilla").await;

    let response = app.get(INGREDIENTS_URL).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Vec<Value>> = response.json();
    let names: Vec<&str> = body.data.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Vanilla", "Kale"]);
}

#[tokio::test]
async fn test_ingredients_limited_to_user() {
    let app = setup_test_app().await;
    let other = insert_user(&app.db, "other@example.com").await;
    app.create_ingredient(other.id, "Salt").await;
    let mine = app.create_ingredient(app.user.id, "Pepper").await;

    let response = app.get(INGREDIENTS_URL).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0]["id"], mine.id);
}

#[tokio::test]
async fn test_get_ingredient_detail() {
    let app = setup_test_app().await;
    let created = app.create_ingredient(app.user.id, "Basil").await;

    let response = app.get(&format!("{}/{}", INGREDIENTS_URL, created.id)).await;

    response.assert_status(StatusCode::OK);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["name"], "Basil");
}

#[tokio::test]
async fn test_update_ingredient() {
    let app = setup_test_app().await;
    let created = app.create_ingredient(app.user.id, "Cilantro").await;

    let response = app
        .patch(&format!("{}/{}", INGREDIENTS_URL, created.id))
        .json(&json!({"name": "Coriander"}))
        .await;

    response.assert_status(StatusCode::OK);
    let stored = ingredient::Entity::find_by_id(created.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(stored.name, "Coriander");
}

#[tokio::test]
async fn test_update_ingredient_blank_name() {
    let app = setup_test_app().await;
    let created = app.create_ingredient(app.user.id, "Cilantro").await;

    let response = app
        .put(&format!("{}/{}", INGREDIENTS_URL, created.id))
        .json(&json!({"name": "  "}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_ingredient() {
    let app = setup_test_app().await;
    let created = app.create_ingredient(app.user.id, "Lettuce").await;

    let response = app.delete(&format!("{}/{}", INGREDIENTS_URL, created.id)).await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(ingredient::Entity::find_by_id(created.id).one(&app.db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_filter_ingredients_assigned_to_recipes() {
    let app = setup_test_app().await;
    let apples = app.create_ingredient(app.user.id, "Apples").await;
    app.create_ingredient(app.user.id, "Turkey").await;
    let crumble = app.create_recipe(app.user.id, "Apple Crumble").await;
    app.attach_ingredient(crumble.id, apples.id).await;

    let response = app.get(&format!("{}?assigned_only=1", INGREDIENTS_URL)).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
    assert_eq!(body.data[0]["name"], "Apples");
}

#[tokio::test]
async fn test_filtered_ingredients_unique() {
    let app = setup_test_app().await;
    let eggs = app.create_ingredient(app.user.id, "Eggs").await;
    app.create_ingredient(app.user.id, "Lentils").await;
    let benedict = app.create_recipe(app.user.id, "Eggs Benedict").await;
    let herb = app.create_recipe(app.user.id, "Herb Eggs").await;
    app.attach_ingredient(benedict.id, eggs.id).await;
    app.attach_ingredient(herb.id, eggs.id).await;

    let response = app.get(&format!("{}?assigned_only=1", INGREDIENTS_URL)).await;

    let body: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(body.data.len(), 1);
}

#[tokio::test]
async fn test_token_cache_populated_on_login() {
    let app = setup_test_app().await;

    app.get("/api/v1/users/me").await.assert_status(StatusCode::OK);

    // Deleting the token row is not enough once the key is cached
    auth_token::Entity::delete_by_id(app.token.clone())
        .exec(&app.db)
        .await
        .unwrap();
    app.get("/api/v1/users/me").await.assert_status(StatusCode::OK);
}
