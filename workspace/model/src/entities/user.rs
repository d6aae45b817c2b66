use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use thiserror::Error;
use tracing::{debug, instrument};

/// Represents an account of the system.
/// The email address is the login identity; there is no separate username.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 hash in PHC string format. Never the raw password.
    pub password: String,
    pub name: String,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    #[sea_orm(default_value = "false")]
    pub is_staff: bool,
    #[sea_orm(default_value = "false")]
    pub is_superuser: bool,
    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipe,
    #[sea_orm(has_many = "super::tag::Entity")]
    Tag,
    #[sea_orm(has_many = "super::ingredient::Entity")]
    Ingredient,
    #[sea_orm(has_one = "super::auth_token::Entity")]
    AuthToken,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Errors raised by the user store.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User must have an email address")]
    MissingEmail,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fields needed to register a regular account.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Normalizes an email address by lower-casing its domain part.
///
/// The local part is case sensitive per RFC 5321 and is left untouched.
/// Input without an `@` is returned as given.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Hashes a raw password with Argon2id and a random salt.
pub fn hash_password(raw: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

impl Model {
    /// Checks a raw password against the stored hash.
    /// A malformed stored hash never verifies.
    pub fn check_password(&self, raw: &str) -> bool {
        match PasswordHash::new(&self.password) {
            Ok(parsed) => Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Creates and saves a regular user.
#[instrument(skip(db, new_user), fields(email = %new_user.email))]
pub async fn create_user<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<Model, UserError> {
    insert_user(db, new_user, false).await
}

/// Creates and saves a user with staff and superuser flags set.
#[instrument(skip(db, password))]
pub async fn create_superuser<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password: &str,
) -> Result<Model, UserError> {
    let new_user = NewUser {
        email: email.to_string(),
        password: password.to_string(),
        name: String::new(),
    };
    insert_user(db, new_user, true).await
}

async fn insert_user<C: ConnectionTrait>(db: &C, new_user: NewUser, superuser: bool) -> Result<Model, UserError> {
    if new_user.email.trim().is_empty() {
        return Err(UserError::MissingEmail);
    }

    let email = normalize_email(&new_user.email);
    debug!("Inserting user {} (superuser: {})", email, superuser);

    let user = ActiveModel {
        email: Set(email),
        password: Set(hash_password(&new_user.password)?),
        name: Set(new_user.name),
        is_active: Set(true),
        is_staff: Set(superuser),
        is_superuser: Set(superuser),
        last_login: Set(None),
        ..Default::default()
    };

    Ok(user.insert(db).await?)
}

/// Finds a user by email, normalizing the address first.
pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
}
