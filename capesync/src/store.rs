use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

const INDENT: &[u8] = b"    ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Username to cape URL index persisted as `users.json`.
///
/// Keys keep their insertion order, so entries loaded from disk stay where they
/// were and new users are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStore {
    entries: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Missing,
    Loaded(usize),
    Corrupt(String),
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub store: UserStore,
    pub status: LoadStatus,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the store at `path`. A missing or unparsable file yields an empty
    /// store; only I/O failures other than not-found are errors.
    pub async fn load(path: &Path) -> Result<LoadOutcome, StoreError> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(LoadOutcome {
                    store: Self::new(),
                    status: LoadStatus::Missing,
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let outcome = match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(entries)) => {
                let count = entries.len();
                LoadOutcome {
                    store: Self { entries },
                    status: LoadStatus::Loaded(count),
                }
            }
            Ok(other) => LoadOutcome {
                store: Self::new(),
                status: LoadStatus::Corrupt(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )),
            },
            Err(err) => LoadOutcome {
                store: Self::new(),
                status: LoadStatus::Corrupt(err.to_string()),
            },
        };
        Ok(outcome)
    }

    /// Overwrites `path` with the whole store as 4-space indented JSON.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let encoded = self.to_pretty_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(path, encoded)
            .await
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn to_pretty_json(&self) -> Result<Vec<u8>, StoreError> {
        let mut out = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
        self.entries.serialize(&mut serializer)?;
        Ok(out)
    }

    pub fn get(&self, username: &str) -> Option<&Value> {
        self.entries.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.entries.contains_key(username)
    }

    pub fn set_url(&mut self, username: &str, url: String) {
        self.entries.insert(username.to_string(), Value::String(url));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(S, S)> for UserStore {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(user, url)| (user.into(), Value::String(url.into())))
                .collect(),
        }
    }
}

/// Per-user classification of a merged store against the store it started from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl StoreDiff {
    pub fn between(prior: &UserStore, merged: &UserStore) -> Self {
        let mut diff = Self::default();
        for (username, value) in &merged.entries {
            match prior.get(username) {
                None => diff.added.push(username.clone()),
                Some(old) if old != value => diff.updated.push(username.clone()),
                Some(_) => diff.unchanged.push(username.clone()),
            }
        }
        diff
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
