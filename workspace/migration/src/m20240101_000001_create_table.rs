use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Email, 255).unique_key())
                    .col(string(Users::Password))
                    .col(string_len(Users::Name, 255))
                    .col(boolean(Users::IsActive).default(true))
                    .col(boolean(Users::IsStaff).default(false))
                    .col(boolean(Users::IsSuperuser).default(false))
                    .col(timestamp_with_time_zone_null(Users::LastLogin))
                    .to_owned(),
            )
            .await?;

        // Create auth_tokens table (one token per user)
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(string_len(AuthTokens::Key, 40).primary_key())
                    .col(integer(AuthTokens::UserId).unique_key())
                    .col(timestamp_with_time_zone(AuthTokens::Created))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_tokens_user")
                            .from(AuthTokens::Table, AuthTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes table
        manager
            .create_table(
                Table::create()
                    .table(Recipes::Table)
                    .if_not_exists()
                    .col(pk_auto(Recipes::Id))
                    .col(integer(Recipes::UserId))
                    .col(string_len(Recipes::Title, 255))
                    .col(integer(Recipes::TimeMinutes))
                    .col(decimal_len(Recipes::Price, 5, 2))
                    .col(text(Recipes::Description).default(""))
                    .col(string_len(Recipes::Link, 255).default(""))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_user")
                            .from(Recipes::Table, Recipes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tags table
        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(pk_auto(Tags::Id))
                    .col(integer(Tags::UserId))
                    .col(string_len(Tags::Name, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_user")
                            .from(Tags::Table, Tags::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tags_user_name")
                    .table(Tags::Table)
                    .col(Tags::UserId)
                    .col(Tags::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create ingredients table
        manager
            .create_table(
                Table::create()
                    .table(Ingredients::Table)
                    .if_not_exists()
                    .col(pk_auto(Ingredients::Id))
                    .col(integer(Ingredients::UserId))
                    .col(string_len(Ingredients::Name, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ingredients_user")
                            .from(Ingredients::Table, Ingredients::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_user_name")
                    .table(Ingredients::Table)
                    .col(Ingredients::UserId)
                    .col(Ingredients::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create recipes_tags table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesTags::Table)
                    .if_not_exists()
                    .col(integer(RecipesTags::RecipeId))
                    .col(integer(RecipesTags::TagId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_tags")
                            .col(RecipesTags::RecipeId)
                            .col(RecipesTags::TagId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_recipe")
                            .from(RecipesTags::Table, RecipesTags::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_tags_tag")
                            .from(RecipesTags::Table, RecipesTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create recipes_ingredients table (join table)
        manager
            .create_table(
                Table::create()
                    .table(RecipesIngredients::Table)
                    .if_not_exists()
                    .col(integer(RecipesIngredients::RecipeId))
                    .col(integer(RecipesIngredients::IngredientId))
                    .primary_key(
                        Index::create()
                            .name("pk_recipes_ingredients")
                            .col(RecipesIngredients::RecipeId)
                            .col(RecipesIngredients::IngredientId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_recipe")
                            .from(RecipesIngredients::Table, RecipesIngredients::RecipeId)
                            .to(Recipes::Table, Recipes::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recipes_ingredients_ingredient")
                            .from(RecipesIngredients::Table, RecipesIngredients::IngredientId)
                            .to(Ingredients::Table, Ingredients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to respect foreign key constraints
        manager
            .drop_table(Table::drop().table(RecipesIngredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipesTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Password,
    Name,
    IsActive,
    IsStaff,
    IsSuperuser,
    LastLogin,
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Key,
    UserId,
    Created,
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Id,
    UserId,
    Title,
    TimeMinutes,
    Price,
    Description,
    Link,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    UserId,
    Name,
}

#[derive(DeriveIden)]
enum Ingredients {
    Table,
    Id,
    UserId,
    Name,
}

#[derive(DeriveIden)]
enum RecipesTags {
    Table,
    RecipeId,
    TagId,
}

#[derive(DeriveIden)]
enum RecipesIngredients {
    Table,
    RecipeId,
    IngredientId,
}
