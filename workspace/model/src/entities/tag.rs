use sea_orm::entity::prelude::*;

use super::{recipe, recipe_tag, user};

/// Maximum length of a tag name.
pub const NAME_MAX_LENGTH: usize = 255;

/// A label for filtering recipes (e.g. "Vegan", "Dinner").
/// Names are unique per owning user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
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
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<recipe::Entity> for Entity {
    fn to() -> RelationDef {
        recipe_tag::Relation::Recipe.def()
    }
    fn via() -> Option<RelationDef> {
        Some(recipe_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
