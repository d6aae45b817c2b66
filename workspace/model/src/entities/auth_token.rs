use rand::RngCore;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use tracing::debug;

use super::user;

/// Number of random bytes behind a token key; hex encoding doubles it.
const KEY_BYTES: usize = 20;

/// Opaque bearer token issued to a user.
/// Each user holds at most one token.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Generates a new random 40 character hex key.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns the user's token, creating one if the user has none yet.
pub async fn get_or_create_for_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Model, DbErr> {
    if let Some(existing) = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    debug!("Issuing new auth token for user {}", user_id);
    ActiveModel {
        key: Set(generate_key()),
        user_id: Set(user_id),
        created: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await
}

/// Resolves a token key to the user owning it.
pub async fn find_user_by_key<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<user::Model>, DbErr> {
    let token = match Entity::find_by_id(key.to_string()).one(db).await? {
        Some(token) => token,
        None => return Ok(None),
    };

    user::Entity::find_by_id(token.user_id).one(db).await
}
