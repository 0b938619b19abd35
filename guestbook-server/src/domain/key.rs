use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

/// Identity of a stored entity: its kind plus the numeric id the datastore
/// assigned on insert. The public form is URL-safe and opaque to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    kind: String,
    id: i64,
}

impl Key {
    pub fn new(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn urlsafe(&self) -> String {
        let serialized = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(serialized)
    }

    /// Returns `None` for anything that is not a key this service issued.
    pub fn from_urlsafe(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
        let key: Key = serde_json::from_slice(&bytes).ok()?;
        if key.kind.is_empty() || key.id <= 0 {
            return None;
        }
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.urlsafe())
    }
}
