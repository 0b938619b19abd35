use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post not found: {0}")]
    PostNotFound(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("invalid next_token: {0}")]
    InvalidCursor(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) | DomainError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Datastore failures are logged where they happen; keep them out of the body.
        let message = match self {
            DomainError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            DomainError::PostNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::InvalidCursor(_) => Some(json!({ "field": "next_token" })),
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DomainError> for tonic::Status {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::PostNotFound(id) => {
                tonic::Status::not_found(format!("Post \"{id}\" not found."))
            }
            DomainError::Validation(msg) | DomainError::InvalidCursor(msg) => {
                tonic::Status::invalid_argument(msg)
            }
            DomainError::Unauthorized(msg) => tonic::Status::unauthenticated(msg),
            DomainError::Internal(_) => tonic::Status::internal("internal server error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_http_status() {
        assert_eq!(
            DomainError::PostNotFound("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::Validation("name is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::InvalidCursor("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DomainError::Internal("db down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn maps_errors_to_grpc_status() {
        let status: tonic::Status = DomainError::PostNotFound("abc".into()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status: tonic::Status = DomainError::InvalidCursor("bad".into()).into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status: tonic::Status = DomainError::Internal("db down".into()).into();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert_eq!(status.message(), "internal server error");
    }
}
