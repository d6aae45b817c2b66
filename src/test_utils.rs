use axum::http::{header::AUTHORIZATION, HeaderValue};
use axum_test::{TestRequest, TestServer};
use migration::{Migrator, MigratorTrait};
use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use tempfile::TempDir;

use model::entities::{auth_token, ingredient, recipe, recipe_ingredient, recipe_tag, tag, user};

use crate::router::create_router;
use crate::schemas::AppState;

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    db
}

/// Send logs to the test output; level comes from RUST_LOG, default warn.
fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// A running test server plus an authenticated user.
pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
    pub user: user::Model,
    pub token: String,
    pub media_dir: TempDir,
}

/// Inserts a user without hashing, for tests that never log in.
pub async fn insert_user(db: &DatabaseConnection, email: &str) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        password: Set("!".to_string()),
        name: Set("Test Name".to_string()),
        is_active: Set(true),
        is_staff: Set(false),
        is_superuser: Set(false),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create test user")
}

/// Build the app around a fresh database and a user holding a token.
pub async fn setup_test_app() -> TestApp {
    init_test_tracing();

    let db = setup_test_db().await;
    let media_dir = tempfile::tempdir().expect("Failed to create media dir");
    let state = AppState {
        db: db.clone(),
        token_cache: Cache::new(100),
        media_root: media_dir.path().to_path_buf(),
    };

    let user = insert_user(&db, "user@example.com").await;
    let token = auth_token::get_or_create_for_user(&db, user.id)
        .await
        .expect("Failed to create token")
        .key;

    let server = TestServer::new(create_router(state)).expect("Failed to start test server");

    TestApp {
        server,
        db,
        user,
        token,
        media_dir,
    }
}

impl TestApp {
    fn authorization(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Token {}", self.token)).expect("Invalid token header")
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.server.get(path).add_header(AUTHORIZATION, self.authorization())
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.server.post(path).add_header(AUTHORIZATION, self.authorization())
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.server.put(path).add_header(AUTHORIZATION, self.authorization())
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        self.server.patch(path).add_header(AUTHORIZATION, self.authorization())
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.server.delete(path).add_header(AUTHORIZATION, self.authorization())
    }

    pub async fn create_recipe(&self, user_id: i32, title: &str) -> recipe::Model {
        recipe::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            time_minutes: Set(22),
            price: Set(Decimal::new(525, 2)),
            description: Set("Sample description".to_string()),
            link: Set("http://example.com/recipe.pdf".to_string()),
            image: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create recipe")
    }

    pub async fn create_tag(&self, user_id: i32, name: &str) -> tag::Model {
        tag::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create tag")
    }

    pub async fn create_ingredient(&self, user_id: i32, name: &str) -> ingredient::Model {
        ingredient::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to create ingredient")
    }

    pub async fn attach_tag(&self, recipe_id: i32, tag_id: i32) {
        recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        }
        .insert(&self.db)
        .await
        .expect("Failed to attach tag");
    }

    pub async fn attach_ingredient(&self, recipe_id: i32, ingredient_id: i32) {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        }
        .insert(&self.db)
        .await
        .expect("Failed to attach ingredient");
    }
}
