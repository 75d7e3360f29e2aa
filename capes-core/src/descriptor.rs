use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

const PREMIUM_PREFIX: &str = "premium_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapeCategory {
    Custom,
    Premium,
    Free,
}

impl CapeCategory {
    pub const ALL: [CapeCategory; 3] = [
        CapeCategory::Custom,
        CapeCategory::Premium,
        CapeCategory::Free,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CapeCategory::Custom => "custom",
            CapeCategory::Premium => "premium",
            CapeCategory::Free => "free",
        }
    }
}

impl fmt::Display for CapeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's selected cape as reported by the directory API,
/// e.g. `{"id": "custom_0", "custom": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CapeDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub custom: Option<bool>,
}

impl CapeDescriptor {
    /// The cape id, or `None` when it is absent or empty.
    pub fn cape_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_custom(&self) -> bool {
        self.custom.unwrap_or(false)
    }

    /// The custom flag wins over the id prefix.
    pub fn category(&self) -> CapeCategory {
        if self.is_custom() {
            CapeCategory::Custom
        } else if self
            .cape_id()
            .is_some_and(|id| id.starts_with(PREMIUM_PREFIX))
        {
            CapeCategory::Premium
        } else {
            CapeCategory::Free
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    Descriptor(CapeDescriptor),
    /// The entry could not be read as a descriptor; carries the decode error.
    Malformed(String),
}

/// Username to descriptor listing, in the order the API returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDirectory {
    entries: Vec<(String, RemoteEntry)>,
}

impl RemoteDirectory {
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(username, value)| {
                let entry = match serde_json::from_value::<CapeDescriptor>(value) {
                    Ok(descriptor) => RemoteEntry::Descriptor(descriptor),
                    Err(err) => RemoteEntry::Malformed(err.to_string()),
                };
                (username, entry)
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteEntry)> {
        self.entries
            .iter()
            .map(|(username, entry)| (username.as_str(), entry))
    }
}
