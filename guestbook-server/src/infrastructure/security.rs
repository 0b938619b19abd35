use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::infrastructure::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    /// Authorized party: the OAuth client the token was issued to.
    #[serde(default)]
    pub azp: Option<String>,
    /// Space separated scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// The authenticated party behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub client_id: Option<String>,
}

/// Token verification is delegated to whatever implements this.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Caller, DomainError>;
}

/// HS256 verifier that also enforces the configured client ids, audiences
/// and scopes.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
    allowed_client_ids: Vec<String>,
    scopes: Vec<String>,
}

impl JwtVerifier {
    pub fn new(secret: &str, config: &AuthConfig) -> Self {
        let mut validation = Validation::default();
        if config.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&config.audiences);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            allowed_client_ids: config.allowed_client_ids.clone(),
            scopes: config.scopes.clone(),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Caller, DomainError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| DomainError::Unauthorized(format!("invalid token: {}", e)))?
            .claims;

        if !self.allowed_client_ids.is_empty() {
            let allowed = claims
                .azp
                .as_ref()
                .is_some_and(|azp| self.allowed_client_ids.contains(azp));
            if !allowed {
                return Err(DomainError::Unauthorized("client id not allowed".into()));
            }
        }

        if !self.scopes.is_empty() {
            let granted = claims
                .scope
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .any(|scope| self.scopes.iter().any(|s| s == scope));
            if !granted {
                return Err(DomainError::Unauthorized("missing required scope".into()));
            }
        }

        Ok(Caller {
            subject: claims.sub,
            client_id: claims.azp,
        })
    }
}
