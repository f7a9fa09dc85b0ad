//! HTTP server facade for Libris with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{http::StatusCode, routing::get, Router};
use libris_authz::Credentials;
use libris_db::Database;
use libris_kernel::{InitCtx, ModuleRegistry};

pub mod auth;
pub mod error;
pub mod router;

pub use auth::CurrentCaller;
pub use error::AppError;
use router::RouterBuilder;

/// Start the HTTP server and run until ctrl-c
pub async fn start_server(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
    let server = &ctx.settings.server;
    tracing::info!("starting HTTP server on {}:{}", server.host, server.port);

    let app = build_router(registry, ctx);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", server.host, server.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        server.host,
        server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> Router {
    let settings = ctx.settings;
    let db = ctx.db.clone();
    let mut router_builder =
        RouterBuilder::new().route("/healthz", get(move || health_check(db.clone())));

    for module in registry.modules() {
        router_builder = router_builder.mount_module(module.name(), module.routes(ctx));
    }

    let credentials = Credentials::new(
        settings.auth.admin_tokens.iter().cloned(),
        settings.auth.user_tokens.iter().cloned(),
    );

    router_builder
        .with_openapi(registry)
        .with_credentials(credentials)
        .with_body_limit(settings.server.max_body_bytes)
        .with_timeout(settings.server.request_timeout_ms)
        .with_request_id()
        .with_cors()
        .with_tracing()
        .build()
}

/// Health check endpoint; 503 when the database does not answer
async fn health_check(db: Database) -> (StatusCode, &'static str) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(err) => {
            tracing::error!(%err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reflects_database_state() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(health_check(db.clone()).await.0, StatusCode::OK);

        db.pool().close().await;
        assert_eq!(health_check(db).await.0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
