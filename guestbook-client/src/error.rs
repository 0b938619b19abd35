use serde::Deserialize;
use thiserror::Error;
use tonic::{Code, Status};

#[derive(Debug, Error)]
pub enum GuestbookClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("gRPC transport error: {0}")]
    GrpcError(#[from] tonic::transport::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl GuestbookClientError {
    pub(crate) async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let message = match resp.text().await {
            Ok(text) => serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text),
            Err(err) => err.to_string(),
        };
        Self::from_http_status(status.as_u16(), message)
    }

    pub(crate) fn from_http_status(status: u16, message: String) -> Self {
        match status {
            404 => GuestbookClientError::NotFound(message),
            401 | 403 => GuestbookClientError::Unauthorized(message),
            400 | 422 => GuestbookClientError::InvalidRequest(message),
            status => GuestbookClientError::Server { status, message },
        }
    }
}

impl From<Status> for GuestbookClientError {
    fn from(status: Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::NotFound => GuestbookClientError::NotFound(message),
            Code::Unauthenticated | Code::PermissionDenied => {
                GuestbookClientError::Unauthorized(message)
            }
            Code::InvalidArgument => GuestbookClientError::InvalidRequest(message),
            code => GuestbookClientError::Server {
                status: code as u16,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_http_statuses() {
        assert!(matches!(
            GuestbookClientError::from_http_status(404, "gone".into()),
            GuestbookClientError::NotFound(_)
        ));
        assert!(matches!(
            GuestbookClientError::from_http_status(400, "bad".into()),
            GuestbookClientError::InvalidRequest(_)
        ));
        assert!(matches!(
            GuestbookClientError::from_http_status(503, "down".into()),
            GuestbookClientError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn maps_grpc_codes() {
        let err: GuestbookClientError = Status::not_found("no such post").into();
        assert!(matches!(err, GuestbookClientError::NotFound(msg) if msg == "no such post"));

        let err: GuestbookClientError = Status::unauthenticated("token").into();
        assert!(matches!(err, GuestbookClientError::Unauthorized(_)));
    }
}
