//! Application bootstrap: database, module lifecycle, migrations, server.

use anyhow::Context;
use axum::Router;
use libris_kernel::{settings::Settings, Database, InitCtx, ModuleRegistry};

use crate::modules;

pub struct App {
    settings: Settings,
    db: Database,
    registry: ModuleRegistry,
}

impl App {
    /// Connect, initialize every module, apply pending migrations and start
    /// the modules.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = Database::connect(&settings.database.url, settings.database.max_connections)
            .await
            .with_context(|| format!("failed to connect to {}", settings.database.url))?;
        Self::with_database(settings, db).await
    }

    /// Bootstrap against an already connected database.
    pub async fn with_database(settings: Settings, db: Database) -> anyhow::Result<Self> {
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry);

        let app = Self {
            settings,
            db,
            registry,
        };
        let ctx = app.ctx();

        app.registry.init_modules(&ctx).await?;
        let applied = app
            .db
            .apply_migrations(&app.registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations up to date");
        app.registry.start_modules(&ctx).await?;

        if app.settings.auth.admin_tokens.is_empty() {
            tracing::warn!("no admin tokens configured; every write will be refused");
        }
        tracing::info!(
            env = ?app.settings.environment,
            modules = app.registry.module_count(),
            "libris bootstrap complete"
        );
        Ok(app)
    }

    /// Apply pending migrations without starting any module.
    pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
        let db = Database::connect(&settings.database.url, settings.database.max_connections)
            .await
            .with_context(|| format!("failed to connect to {}", settings.database.url))?;
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry);

        db.apply_migrations(&registry.collect_migrations())
            .await
            .context("failed to apply migrations")
    }

    fn ctx(&self) -> InitCtx<'_> {
        InitCtx {
            settings: &self.settings,
            db: &self.db,
        }
    }

    /// Full HTTP router with every module mounted.
    pub fn router(&self) -> Router {
        libris_http::build_router(&self.registry, &self.ctx())
    }

    /// Serve until ctrl-c, then stop the modules.
    pub async fn serve(self) -> anyhow::Result<()> {
        let result = libris_http::start_server(&self.registry, &self.ctx()).await;
        self.registry.stop_modules().await?;
        result
    }
}
