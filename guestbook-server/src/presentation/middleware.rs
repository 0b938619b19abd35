use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_service::{Service, Transform};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::infrastructure::config::AuthLevel;
use crate::infrastructure::security::{Caller, TokenVerifier};

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
static TIMING_HEADER: HeaderName = HeaderName::from_static("server-timing");

#[derive(Clone)]
pub struct RequestId(pub String);

pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService { service }))
    }
}

pub struct RequestIdService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Client supplied ids are reused only when they can be echoed back verbatim.
        let (request_id, header) = req
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .and_then(|s| HeaderValue::from_str(s).ok().map(|h| (s.to_owned(), h)))
            .unwrap_or_else(|| {
                let id = Uuid::new_v4().to_string();
                let header = HeaderValue::from_str(&id).unwrap_or(HeaderValue::from_static("unknown"));
                (id, header)
            });

        req.extensions_mut().insert(RequestId(request_id));

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            res.response_mut()
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), header);
            Ok(res)
        })
    }
}

/// Gate in front of the post handlers. What it demands depends on the
/// configured [`AuthLevel`]; verified callers are stored in the request
/// extensions.
pub struct AuthGateMiddleware {
    level: AuthLevel,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl AuthGateMiddleware {
    pub fn new(level: AuthLevel, verifier: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self { level, verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGateMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service: Rc::new(service),
            level: self.level,
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    level: AuthLevel,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        if self.level == AuthLevel::None {
            return Box::pin(async move { service.call(req).await });
        }

        let auth_header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let outcome = authorize(self.level, self.verifier.as_deref(), auth_header.as_deref());

        Box::pin(async move {
            match outcome? {
                Some(caller) => {
                    debug!(subject = %caller.subject, "caller authenticated");
                    req.extensions_mut().insert(caller);
                }
                None => debug!("anonymous caller"),
            }
            service.call(req).await
        })
    }
}

/// Shared by the HTTP gate and the gRPC interceptor.
pub fn authorize(
    level: AuthLevel,
    verifier: Option<&dyn TokenVerifier>,
    header: Option<&str>,
) -> Result<Option<Caller>, DomainError> {
    if level == AuthLevel::None {
        return Ok(None);
    }

    let Some(header) = header else {
        return match level {
            AuthLevel::Required => Err(DomainError::Unauthorized(
                "missing authorization header".into(),
            )),
            _ => Ok(None),
        };
    };

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| DomainError::Unauthorized("invalid authorization header".into()))?;
    let verifier = verifier
        .ok_or_else(|| DomainError::Internal("token verifier is not configured".into()))?;

    verifier.verify(token.trim()).map(Some)
}

pub struct TimingMiddleware;

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService { service }))
    }
}

pub struct TimingService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let rid = req
            .extensions()
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".into());

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let duration = start.elapsed();
            info!(
                request_id = %rid,
                method = %method,
                path = %path,
                status = res.status().as_u16(),
                duration_ms = duration.as_millis(),
                "request completed"
            );

            if let Ok(value) = HeaderValue::from_str(&format!("app;dur={}", duration.as_millis())) {
                res.response_mut()
                    .headers_mut()
                    .insert(TIMING_HEADER.clone(), value);
            }

            Ok(res)
        })
    }
}
