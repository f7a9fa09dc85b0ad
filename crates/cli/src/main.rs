//! Libris command line.
//!
//! ```bash
//! libris serve             # default
//! libris migrate
//! LIBRIS_ENV=production libris serve
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::App;
use libris_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "libris", version, about = "Book and author catalog service")]
struct Cli {
    /// Directory holding base.toml and the per-environment overrides.
    #[arg(long, global = true)]
    config_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,

    /// Apply pending database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(cli.config_dir.as_deref())
        .context("failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => App::bootstrap(settings).await?.serve().await,
        Command::Migrate => {
            let applied = App::migrate(&settings).await?;
            tracing::info!(applied, db = %settings.database.url, "migrations applied");
            Ok(())
        }
    }
}
