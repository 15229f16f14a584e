//! JSON seed files.
//!
//! A seed file is an array of entries, parents before children:
//!
//! ```json
//! [
//!   { "placename": "Sierra Leone", "locationType": "country", "adminLevel": 0 },
//!   { "placename": "Bo", "locationType": "district", "parent": "Sierra Leone" }
//! ]
//! ```

use std::path::{Path, PathBuf};

use placetree_domain::{AdminLevel, LocationType};
use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

/// One location to create. `parent` is the parent's compound name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEntry {
    pub placename: String,
    #[serde(default, alias = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub admin_level: Option<AdminLevel>,
    #[serde(default)]
    pub location_code: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Error)]
pub enum SeedFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Seed file not found at {0}")]
    NotFound(PathBuf),
}

pub fn parse_seed(content: &str) -> Result<Vec<SeedEntry>, SeedFileError> {
    Ok(serde_json::from_str(content)?)
}

pub async fn load_seed_file(path: &Path) -> Result<Vec<SeedEntry>, SeedFileError> {
    if !fs::try_exists(path).await? {
        return Err(SeedFileError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).await?;
    let entries = parse_seed(&content)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "Read seed file");
    Ok(entries)
}
