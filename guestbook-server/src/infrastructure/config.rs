use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    /// Tokens are not looked at.
    #[default]
    None,
    /// A token is optional, but one that is sent must be valid.
    Optional,
    Required,
}

impl FromStr for AuthLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(AuthLevel::None),
            "optional" => Ok(AuthLevel::Optional),
            "required" => Ok(AuthLevel::Required),
            other => Err(anyhow::anyhow!("invalid AUTH_LEVEL: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    pub level: AuthLevel,
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub allowed_client_ids: Vec<String>,
    #[serde(default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub grpc_port: u16,
    pub database_url: Option<String>,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let grpc_port = std::env::var("GRPC_PORT")
            .unwrap_or_else(|_| "50051".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid GRPC_PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let cors_origins = list_var("CORS_ORIGINS", "*");

        let level: AuthLevel = std::env::var("AUTH_LEVEL")
            .unwrap_or_default()
            .parse()?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.is_empty());
        if level != AuthLevel::None && jwt_secret.is_none() {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be set when AUTH_LEVEL is not none"
            ));
        }

        Ok(Self {
            host,
            port,
            grpc_port,
            database_url,
            cors_origins,
            auth: AuthConfig {
                level,
                jwt_secret,
                allowed_client_ids: list_var("ALLOWED_CLIENT_IDS", ""),
                audiences: list_var("AUDIENCES", ""),
                scopes: list_var("SCOPES", ""),
            },
        })
    }
}

fn list_var(name: &str, default: &str) -> Vec<String> {
    parse_list(&std::env::var(name).unwrap_or_else(|_| default.into()))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
