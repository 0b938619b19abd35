use std::net::SocketAddr;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::signal;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::application::post_service::PostService;
use crate::data::datastore::Datastore;
use crate::data::memory_datastore::InMemoryDatastore;
use crate::data::postgres_datastore::PostgresDatastore;
use crate::guestbook::guestbook_service_server::GuestbookServiceServer;
use crate::infrastructure::config::{AppConfig, AuthConfig};
use crate::infrastructure::database::{create_pool, run_migrations};
use crate::infrastructure::security::{JwtVerifier, TokenVerifier};
use crate::presentation::grpc_service::{GuestbookGrpcService, auth_interceptor};
use crate::presentation::handlers;
use crate::presentation::middleware::{AuthGateMiddleware, RequestIdMiddleware, TimingMiddleware};

/// Picks the datastore: Postgres when a database URL is configured, an
/// in-process store otherwise.
pub async fn build_datastore(config: &AppConfig) -> anyhow::Result<Arc<dyn Datastore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PostgresDatastore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL is not set, posts are kept in memory");
            Ok(Arc::new(InMemoryDatastore::new()))
        }
    }
}

pub fn build_verifier(auth: &AuthConfig) -> Option<Arc<dyn TokenVerifier>> {
    auth.jwt_secret
        .as_deref()
        .map(|secret| Arc::new(JwtVerifier::new(secret, auth)) as Arc<dyn TokenVerifier>)
}

pub async fn start_rest_server(config: AppConfig, post_service: PostService) -> anyhow::Result<()> {
    let bind_address = (config.host.clone(), config.port);
    let verifier = build_verifier(&config.auth);

    info!(
        host = %bind_address.0,
        port = bind_address.1,
        "HTTP server starting"
    );

    HttpServer::new(move || {
        let cors = build_cors(&config);

        App::new()
            .wrap(cors)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Logger::default())
            .app_data(handlers::json_config())
            .app_data(handlers::query_config())
            .app_data(web::Data::new(post_service.clone()))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health))
                    .service(
                        web::scope("")
                            .wrap(AuthGateMiddleware::new(config.auth.level, verifier.clone()))
                            .configure(handlers::post::configure),
                    ),
            )
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

pub async fn start_grpc_server(config: AppConfig, post_service: PostService) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.grpc_port).parse()?;

    let grpc_service = GuestbookGrpcService::new(post_service);
    let interceptor = auth_interceptor(config.auth.level, build_verifier(&config.auth));

    info!(%addr, "gRPC server starting");

    Server::builder()
        .add_service(GuestbookServiceServer::with_interceptor(
            grpc_service,
            interceptor,
        ))
        .serve_with_shutdown(addr, async {
            if signal::ctrl_c().await.is_err() {
                warn!("failed to listen for ctrl+c");
                std::future::pending::<()>().await;
            }
            info!("gRPC server received shutdown signal");
        })
        .await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .max_age(3600);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
