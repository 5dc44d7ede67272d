//! Keydesk CLI - Admin panel for API clients and their keys
//!
//! Usage:
//!   keydesk [watch]             Live client panel (default)
//!   keydesk ls                  List clients
//!   keydesk create <NAME>       Create a client
//!   keydesk delete <ID>         Delete a client
//!   keydesk gen-key <ID>        Generate a new key for a client
//!   keydesk rename <ID> <NAME>  Rename a client
//!   keydesk show <ID>           Show one client
//!   keydesk inline [OUTPUT]     Bundle the panel into a single HTML file
//!   keydesk serve               Preview the bundle in a browser

mod actions;
mod api;
mod commands;
mod config;
mod inline;
mod panel;
mod poller;
mod render;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Environment, Overrides, Settings};
use keydesk_common::ClientId;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "keydesk")]
#[command(author = "Keydesk Team")]
#[command(version)]
#[command(about = "Manage API clients and their keys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Environment profile to use
    #[arg(short, long, global = true, env = "KEYDESK_ENV", value_enum)]
    env: Option<Environment>,

    /// Base URL of the clients API
    #[arg(long, global = true, env = "KEYDESK_API")]
    api: Option<String>,

    /// Polling interval in milliseconds
    #[arg(long, global = true, env = "KEYDESK_POLLING_INTERVAL_MS")]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live client panel, refreshed when the set of clients changes
    Watch {
        /// Print a table on every change instead of the interactive panel
        #[arg(long)]
        plain: bool,
    },

    /// List clients
    Ls,

    /// Show one client
    Show {
        /// Client ID
        id: ClientId,
    },

    /// Create a client
    Create {
        /// Client name
        name: String,
    },

    /// Delete a client
    Delete {
        /// Client ID
        id: ClientId,
    },

    /// Generate a new key for a client
    GenKey {
        /// Client ID
        id: ClientId,
    },

    /// Rename a client
    Rename {
        /// Client ID
        id: ClientId,

        /// New name
        name: String,
    },

    /// Inline main.js and styles.css into index.html
    Inline {
        /// Output file (default: <DIST>/bundle.html)
        output: Option<PathBuf>,

        /// Build directory holding the compiled assets
        #[arg(long, default_value = "dist")]
        dist: PathBuf,

        /// HTML shell (default: <DIST>/index.html)
        #[arg(long)]
        html: Option<PathBuf>,

        /// Compiled script (default: <DIST>/main.js)
        #[arg(long)]
        js: Option<PathBuf>,

        /// Compiled stylesheet (default: <DIST>/styles.css)
        #[arg(long)]
        css: Option<PathBuf>,
    },

    /// Serve the bundle for a browser preview
    Serve {
        /// Bundle to serve
        #[arg(long, default_value = "dist/bundle.html")]
        bundle: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value_t = commands::serve::DEFAULT_PORT)]
        port: u16,

        /// Open the preview in the default browser
        #[arg(long)]
        open: bool,
    },
}

impl Commands {
    /// Whether the command takes over the terminal
    fn is_interactive(&self) -> bool {
        matches!(self, Commands::Watch { plain: false })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Watch { plain: false });

    init_logging(cli.verbose, command.is_interactive())?;

    let overrides = Overrides {
        environment: cli.env,
        api: cli.api,
        polling_interval_ms: cli.interval,
    };
    let settings = || resolve_settings(&overrides);

    // Handle commands
    match command {
        Commands::Watch { plain } => {
            commands::watch::run(&settings()?, plain).await?;
        }

        Commands::Ls => {
            commands::clients::list(&settings()?).await?;
        }

        Commands::Show { id } => {
            commands::clients::show(&settings()?, id).await?;
        }

        Commands::Create { name } => {
            commands::clients::create(&settings()?, &name).await?;
        }

        Commands::Delete { id } => {
            commands::clients::delete(&settings()?, id).await?;
        }

        Commands::GenKey { id } => {
            commands::clients::gen_key(&settings()?, id).await?;
        }

        Commands::Rename { id, name } => {
            commands::clients::rename(&settings()?, id, &name).await?;
        }

        Commands::Inline {
            output,
            dist,
            html,
            js,
            css,
        } => {
            let opts = commands::inline::InlineOptions {
                output,
                dist,
                html,
                js,
                css,
            };
            commands::inline::run(opts)?;
        }

        Commands::Serve { bundle, port, open } => {
            commands::serve::run(bundle, port, open).await?;
        }
    }

    Ok(())
}

/// Merge flags, environment and the config file into the active settings
fn resolve_settings(overrides: &Overrides) -> Result<Settings> {
    let settings = Settings::resolve(&Config::load()?, overrides)?;
    tracing::debug!(
        environment = settings.environment.as_str(),
        api = %settings.api,
        interval_ms = settings.polling_interval.as_millis() as u64,
        "resolved settings"
    );
    Ok(settings)
}

/// Initialize logging. The interactive panel owns the terminal, so its logs go
/// to a file under the logs directory.
fn init_logging(verbose: bool, interactive: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},keydesk=info", log_level).into());

    if interactive {
        // Only the panel writes under the config directory
        config::ensure_dirs()?;
        let path = config::logs_dir().join("panel.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }

    Ok(())
}
