use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Relative path below the media root, e.g. uploads/recipe/<uuid>.jpg
        manager
            .alter_table(
                Table::alter()
                    .table(Recipes::Table)
                    .add_column(string_null(Recipes::Image))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Recipes::Table)
                    .drop_column(Recipes::Image)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Recipes {
    Table,
    Image,
}
