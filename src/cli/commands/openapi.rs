use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use utoipa::OpenApi;

use crate::cli::OpenApiFormat;
use crate::schemas::ApiDoc;

/// Renders the OpenAPI document in the requested format.
pub fn render_openapi(format: OpenApiFormat) -> Result<String> {
    let doc = ApiDoc::openapi();
    let rendered = match format {
        OpenApiFormat::Json => serde_json::to_string_pretty(&doc)?,
        OpenApiFormat::Yaml => serde_yaml::to_string(&doc)?,
    };
    Ok(rendered)
}

pub fn export_openapi(format: OpenApiFormat, output: Option<&Path>) -> Result<()> {
    let rendered = render_openapi(format)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("OpenAPI document written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
