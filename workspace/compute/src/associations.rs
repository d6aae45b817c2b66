//! Attaching tags and ingredients to recipes by name.
//!
//! Clients send names, not ids. Each name is resolved against the recipe
//! owner's existing tags/ingredients and created when missing, then the
//! recipe's join rows are replaced with the resolved set. Callers are
//! expected to run these inside the same transaction as the recipe write.

use model::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument, trace};

use crate::error::{ComputeError, Result};

/// Trims names, rejects blank or over-long ones and drops duplicates
/// while keeping the first occurrence order.
fn clean_names(names: &[String], max_length: usize, kind: &str) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::with_capacity(names.len());

    for raw in names {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ComputeError::Validation(format!("{} name may not be blank", kind)));
        }
        if name.chars().count() > max_length {
            return Err(ComputeError::Validation(format!(
                "{} name may not exceed {} characters",
                kind, max_length
            )));
        }
        if !cleaned.iter().any(|existing| existing == name) {
            cleaned.push(name.to_string());
        }
    }

    Ok(cleaned)
}

/// Returns the user's tag with this exact name, creating it if absent.
pub async fn get_or_create_tag<C: ConnectionTrait>(db: &C, user_id: i32, name: &str) -> Result<tag::Model> {
    if let Some(existing) = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await?
    {
        trace!("Reusing tag {} ({})", existing.id, name);
        return Ok(existing);
    }

    debug!("Creating tag '{}' for user {}", name, user_id);
    let created = tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(created)
}

/// Returns the user's ingredient with this exact name, creating it if absent.
pub async fn get_or_create_ingredient<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    name: &str,
) -> Result<ingredient::Model> {
    if let Some(existing) = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(user_id))
        .filter(ingredient::Column::Name.eq(name))
        .one(db)
        .await?
    {
        trace!("Reusing ingredient {} ({})", existing.id, name);
        return Ok(existing);
    }

    debug!("Creating ingredient '{}' for user {}", name, user_id);
    let created = ingredient::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(created)
}

/// Replaces the recipe's tags with the given names.
///
/// Tags are scoped to the recipe owner. An empty slice clears all tags.
/// Returns the resolved tags in input order.
#[instrument(skip(db, recipe, names), fields(recipe_id = recipe.id, count = names.len()))]
pub async fn set_recipe_tags<C: ConnectionTrait>(
    db: &C,
    recipe: &recipe::Model,
    names: &[String],
) -> Result<Vec<tag::Model>> {
    let names = clean_names(names, tag::NAME_MAX_LENGTH, "Tag")?;

    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
        .exec(db)
        .await?;

    let mut tags = Vec::with_capacity(names.len());
    for name in &names {
        let tag = get_or_create_tag(db, recipe.user_id, name).await?;
        recipe_tag::ActiveModel {
            recipe_id: Set(recipe.id),
            tag_id: Set(tag.id),
        }
        .insert(db)
        .await?;
        tags.push(tag);
    }

    debug!("Recipe {} now has {} tags", recipe.id, tags.len());
    Ok(tags)
}

/// Replaces the recipe's ingredients with the given names.
///
/// Same rules as [`set_recipe_tags`].
#[instrument(skip(db, recipe, names), fields(recipe_id = recipe.id, count = names.len()))]
pub async fn set_recipe_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe: &recipe::Model,
    names: &[String],
) -> Result<Vec<ingredient::Model>> {
    let names = clean_names(names, ingredient::NAME_MAX_LENGTH, "Ingredient")?;

    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .exec(db)
        .await?;

    let mut ingredients = Vec::with_capacity(names.len());
    for name in &names {
        let ingredient = get_or_create_ingredient(db, recipe.user_id, name).await?;
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(ingredient.id),
        }
        .insert(db)
        .await?;
        ingredients.push(ingredient);
    }

    debug!("Recipe {} now has {} ingredients", recipe.id, ingredients.len());
    Ok(ingredients)
}
