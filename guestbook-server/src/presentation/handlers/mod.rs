pub mod post;

use actix_web::web;

use crate::domain::error::DomainError;

/// Malformed or incomplete bodies answer with the same error shape as the
/// handlers do.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| DomainError::Validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| DomainError::Validation(err.to_string()).into())
}
