use std::path::{Path, PathBuf};

use capes_core::CapeCategory;
use thiserror::Error;

const CAPE_EXTENSION: &str = "png";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("cape id is empty")]
    Empty,
    #[error("cape id {0:?} is not a plain file name")]
    UnsupportedId(String),
}

/// `<id>.png`, provided the id can't escape its category directory.
pub fn cape_file_name(cape_id: &str) -> Result<String, PathError> {
    if cape_id.is_empty() {
        return Err(PathError::Empty);
    }
    let unsupported = matches!(cape_id, "." | "..")
        || cape_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0'));
    if unsupported {
        return Err(PathError::UnsupportedId(cape_id.to_string()));
    }
    Ok(format!("{cape_id}.{CAPE_EXTENSION}"))
}

pub fn category_dir(capes_dir: &Path, category: CapeCategory) -> PathBuf {
    capes_dir.join(category.as_str())
}

pub fn cape_target_path(
    capes_dir: &Path,
    category: CapeCategory,
    cape_id: &str,
) -> Result<PathBuf, PathError> {
    Ok(category_dir(capes_dir, category).join(cape_file_name(cape_id)?))
}

pub fn cape_repo_url(
    repo_url: &str,
    category: CapeCategory,
    cape_id: &str,
) -> Result<String, PathError> {
    Ok(format!(
        "{}/{}/{}",
        repo_url.trim_end_matches('/'),
        category,
        cape_file_name(cape_id)?
    ))
}

pub async fn ensure_category_dirs(capes_dir: &Path) -> std::io::Result<()> {
    for category in CapeCategory::ALL {
        tokio::fs::create_dir_all(category_dir(capes_dir, category)).await?;
    }
    Ok(())
}
