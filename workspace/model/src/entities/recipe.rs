use std::path::Path;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use super::{ingredient, recipe_ingredient, recipe_tag, tag, user};

/// Directory, relative to the media root, where recipe images are stored.
pub const IMAGE_UPLOAD_DIR: &str = "uploads/recipe";

/// A recipe owned by a single user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The user who owns this recipe.
    pub user_id: i32,
    pub title: String,
    pub time_minutes: i32,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub link: String,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
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
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTag,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredient,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<tag::Entity> for Entity {
    fn to() -> RelationDef {
        recipe_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(recipe_tag::Relation::Recipe.def().rev())
    }
}

impl Related<ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        recipe_ingredient::Relation::Ingredient.def()
    }
    fn via() -> Option<RelationDef> {
        Some(recipe_ingredient::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Builds a unique storage path for an uploaded recipe image.
///
/// The original file name only contributes its extension (lower-cased);
/// the stem is replaced by a random UUID so uploads never collide.
pub fn image_upload_path(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    format!("{}/{}{}", IMAGE_UPLOAD_DIR, Uuid::new_v4(), extension)
}
