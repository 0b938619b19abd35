mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

pub mod guestbook {
    tonic::include_proto!("guestbook");
}

use application::post_service::PostService;
use infrastructure::config::AppConfig;
use infrastructure::logging::init_logging;
use server::{build_datastore, start_grpc_server, start_rest_server};
use tracing::error;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let datastore = build_datastore(&config).await?;
    let post_service = PostService::new(datastore);

    let grpc = tokio::spawn(start_grpc_server(config.clone(), post_service.clone()));
    let rest = start_rest_server(config, post_service).await;

    grpc.abort();
    if let Err(err) = &rest {
        error!(error = %err, "HTTP server stopped with an error");
    }
    rest
}
