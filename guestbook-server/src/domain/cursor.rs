use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CursorPayload {
    kind: String,
    after: i64,
}

/// Position in a query over one kind, pointing just past `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    kind: String,
    after: i64,
}

impl Cursor {
    pub fn new(kind: impl Into<String>, after: i64) -> Self {
        Self {
            kind: kind.into(),
            after,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn after(&self) -> i64 {
        self.after
    }

    pub fn encode(&self) -> String {
        let payload = CursorPayload {
            kind: self.kind.clone(),
            after: self.after,
        };
        let serialized = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(serialized)
    }

    pub fn decode(token: &str) -> Result<Self, DomainError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|err| DomainError::InvalidCursor(err.to_string()))?;
        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|err| DomainError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            kind: payload.kind,
            after: payload.after,
        })
    }

    /// Decodes a token issued for a query over `kind`. Absent or empty
    /// tokens mean "start from the beginning".
    pub fn decode_for(kind: &str, token: Option<&str>) -> Result<Option<Self>, DomainError> {
        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };
        let cursor = Self::decode(token)?;
        if cursor.kind != kind {
            return Err(DomainError::InvalidCursor(format!(
                "cursor was issued for kind {}",
                cursor.kind
            )));
        }
        Ok(Some(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_token_starts_from_beginning() {
        assert_eq!(Cursor::decode_for("Post", None).unwrap(), None);
        assert_eq!(Cursor::decode_for("Post", Some("")).unwrap(), None);
    }

    #[test]
    fn token_survives_the_wire() {
        let token = Cursor::new("Post", 17).encode();
        let decoded = Cursor::decode_for("Post", Some(&token)).unwrap().unwrap();
        assert_eq!(decoded.after(), 17);
        assert_eq!(decoded.kind(), "Post");
    }

    #[test]
    fn rejects_cursor_of_another_kind() {
        let token = Cursor::new("Comment", 3).encode();
        let err = Cursor::decode_for("Post", Some(&token)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));
    }

    #[test]
    fn rejects_malformed_token() {
        let err = Cursor::decode_for("Post", Some("@@not base64@@")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));

        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        let err = Cursor::decode_for("Post", Some(&not_json)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCursor(_)));
    }
}
