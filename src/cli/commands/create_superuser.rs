use anyhow::{Context, Result};
use model::entities::user;
use sea_orm::Database;
use tracing::{debug, info, trace};

pub async fn create_superuser(database_url: &str, email: &str, password: &str) -> Result<()> {
    trace!("Entering create_superuser function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", database_url))?;

    let created = user::create_superuser(&db, email, password)
        .await
        .context("Failed to create superuser")?;

    info!("Superuser {} created with ID {}", created.email, created.id);
    Ok(())
}
