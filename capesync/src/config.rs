use std::path::{Path, PathBuf};

use anyhow::Context;
use capes_core::DEFAULT_API_URL;

pub const DEFAULT_REPO_URL: &str =
    "https://raw.githubusercontent.com/patekcz/Capetain/main/api/capes";

const API_URL_ENV: &str = "CAPESYNC_API_URL";
const REPO_URL_ENV: &str = "CAPESYNC_REPO_URL";
const BASE_DIR_ENV: &str = "CAPESYNC_BASE_DIR";
const CAPES_DIR_ENV: &str = "CAPESYNC_CAPES_DIR";
const USERS_JSON_ENV: &str = "CAPESYNC_USERS_JSON";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Directory endpoint; textures are served from `<api_url>/cape/<id>`.
    pub api_url: String,
    /// Public mirror the stored URLs point at.
    pub repo_url: String,
    pub capes_dir: PathBuf,
    pub users_json: PathBuf,
}

impl SyncConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("current directory is unavailable")?;
        let home = dirs::home_dir();
        Ok(Self::from_lookup(
            |name| std::env::var(name).ok(),
            &cwd,
            home.as_deref(),
        ))
    }

    /// Builds the configuration from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F, cwd: &Path, home: Option<&Path>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let read_path = |name: &str| read(name).map(|value| expand_with_home(&value, home));

        let base_dir = read_path(BASE_DIR_ENV).unwrap_or_else(|| cwd.to_path_buf());
        let api_dir = base_dir.join("api");
        let capes_dir = read_path(CAPES_DIR_ENV).unwrap_or_else(|| api_dir.join("capes"));
        let users_json = read_path(USERS_JSON_ENV).unwrap_or_else(|| api_dir.join("users.json"));

        Self {
            api_url: read(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            repo_url: read(REPO_URL_ENV).unwrap_or_else(|| DEFAULT_REPO_URL.to_string()),
            capes_dir,
            users_json,
        }
    }
}

fn expand_with_home(value: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(value);
    };
    if value == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = value.strip_prefix("~/") {
        return home.join(rest);
    }
    PathBuf::from(value)
}
