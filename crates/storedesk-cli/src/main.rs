//! storedesk - command-line console for the shop back office.
//!
//! Signs in against the admin API, keeps the session token on this device,
//! and gives quick access to the back-office records.

mod app;
mod cli;
mod render;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storedesk_core::listing::ListQuery;
use storedesk_core::Config;

use app::App;
use cli::{Args, Command};

/// Log file prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "storedesk.log";

/// Initialize the tracing subscriber for logging.
///
/// RUST_LOG controls the level (default `warn`). When `log_dir` is set, a
/// daily rolling file receives the same events; the returned guard flushes it.
fn init_tracing(log_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

async fn run(args: Args) -> Result<()> {
    let mut app = App::new(args.api)?;
    info!(api = %app.config().api_base_url, "storedesk starting");

    match args.command {
        Command::Login { username, password } => app.login(username, password).await,
        Command::Logout => app.logout(),
        Command::Status => {
            app.status();
            Ok(())
        }
        Command::Open { path } => app.open(&path),
        Command::List {
            resource,
            search,
            columns,
            status,
            page,
        } => {
            let query = ListQuery {
                search,
                columns,
                status,
                page,
            };
            app.list(resource.into(), query).await
        }
        Command::Show { resource, id } => app.show(resource.into(), id).await,
        Command::Delete { resource, id } => app.delete(resource.into(), id).await,
        Command::Save {
            resource,
            target,
            file,
        } => app.save(resource.into(), target, &file).await,
        Command::OrderStatus { id, status } => app.update_order_status(id, status).await,
        Command::Media {
            product,
            add,
            remove,
        } => app.media(product, add, remove).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Only the log directory is needed this early; App reloads the full config
    let log_dir = Config::load().ok().and_then(|c| c.log_dir);
    let _guard = init_tracing(log_dir.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
