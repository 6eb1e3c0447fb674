//! Persisted browser session state
//!
//! Mirrors the `storageState` document written by browser automation tools:
//! a list of cookies plus per-origin local storage. Only the first origin is
//! ever inspected by the cache logic, but the whole document is kept so the
//! browser layer can seed new contexts from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
    /// Sections this crate does not interpret, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
    /// Attributes such as `expires`, `httpOnly` or `sameSite`, kept verbatim.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginState {
    pub origin: String,
    #[serde(rename = "localStorage", default)]
    pub local_storage: Vec<StorageEntry>,
    /// Per-origin state such as `indexedDB`, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl OriginState {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            local_storage: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_entry(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_storage.push(StorageEntry::new(name, value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.local_storage
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }
}

impl SessionSnapshot {
    pub fn with_origin(mut self, origin: OriginState) -> Self {
        self.origins.push(origin);
        self
    }

    /// The origin whose local storage the cache logic looks at.
    pub fn first_origin(&self) -> Option<&OriginState> {
        self.origins.first()
    }

    /// Look up a local-storage value on the first recorded origin only.
    pub fn local_storage_value(&self, name: &str) -> Option<&str> {
        self.first_origin().and_then(|origin| origin.get(name))
    }
}
