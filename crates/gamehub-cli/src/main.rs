//! GameHub CLI
//!
//! Scans the installed storefronts (Steam, GOG, a reference directory),
//! keeps the game database in sync with them and launches games.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile every enabled platform
//! gamehub scan
//!
//! # Browse and search
//! gamehub list --platform steam --tag steam
//! gamehub search "half-life"
//!
//! # Start a game
//! gamehub launch steam 440
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamehub_config::GameHubConfig;
use gamehub_library::{GameDatabase, GameLauncher, Library, ProcessLauncher, platforms};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// GameHub - one library for all your game launchers
#[derive(Parser)]
#[command(name = "gamehub")]
#[command(about = "Aggregate and launch games from Steam, GOG and local directories")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the system and user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List platforms, including search and favourites
    Platforms,

    /// Reconcile platforms with what is installed
    Scan {
        /// Only scan this platform
        #[arg(short, long)]
        platform: Option<String>,

        /// Also look up game icons
        #[arg(long)]
        icons: bool,
    },

    /// List known games
    List {
        #[arg(short, long)]
        platform: Option<String>,

        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Search titles and aliases on enabled platforms
    Search { term: String },

    /// List favourite games
    Favourites,

    /// Mark a game as favourite
    Favourite {
        platform: String,
        external_id: String,

        /// Remove the favourite flag instead
        #[arg(long)]
        off: bool,
    },

    /// Launch a game
    Launch {
        platform: String,
        external_id: String,
    },

    /// Enable a platform
    Enable { platform: String },

    /// Disable a platform
    Disable { platform: String },
}

fn setup_logging(filter: &str, verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<GameHubConfig> {
    let config = match path {
        Some(path) => GameHubConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameHubConfig::load_default().context("Failed to load configuration")?,
    };
    Ok(config)
}

/// Cancel `token` on the first Ctrl-C
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    setup_logging(&config.logging.filter, cli.verbose);

    tracing::debug!("Using database {}", config.library.database_path.display());

    let launcher: Arc<dyn GameLauncher> = Arc::new(ProcessLauncher::new());
    let registry = platforms::builtin_registry(&config.platforms, launcher);
    let db = GameDatabase::open(&config.library.database_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.library.database_path.display()
        )
    })?;
    let mut library = Library::open(db, &registry)?.with_parallel_scans(config.scan.parallel);

    match cli.command {
        Commands::Platforms => commands::platforms(&library),
        Commands::Scan { platform, icons } => {
            let token = CancellationToken::new();
            cancel_on_ctrl_c(token.clone());
            let ctx = gamehub_library::ScanContext::new(icons || config.scan.expensive_icons)
                .with_cancel_token(token);
            commands::scan(&mut library, platform.as_deref(), &ctx).await
        }
        Commands::List { platform, tag } => {
            commands::list(&library, platform.as_deref(), tag.as_deref())
        }
        Commands::Search { term } => commands::search(&mut library, &term),
        Commands::Favourites => commands::favourites(&library),
        Commands::Favourite {
            platform,
            external_id,
            off,
        } => {
            library.set_favourite(&platform, &external_id, !off)?;
            println!(
                "{} {}:{}",
                if off { "Unfavourited" } else { "Favourited" },
                platform,
                external_id
            );
            Ok(())
        }
        Commands::Launch {
            platform,
            external_id,
        } => {
            let result = library.launch(&platform, &external_id)?;
            println!("Started {} (pid {})", result.program.display(), result.pid);
            Ok(())
        }
        Commands::Enable { platform } => {
            library.set_enabled(&platform, true)?;
            println!("Enabled {}", platform);
            Ok(())
        }
        Commands::Disable { platform } => {
            library.set_enabled(&platform, false)?;
            println!("Disabled {}", platform);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::parse_from(["gamehub", "scan", "--platform", "Steam", "--icons"]);
        match cli.command {
            Commands::Scan { platform, icons } => {
                assert_eq!(platform.as_deref(), Some("Steam"));
                assert!(icons);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_parse_favourite_off_with_global_flags() {
        let cli = Cli::parse_from([
            "gamehub",
            "favourite",
            "GOG",
            "1207658924",
            "--off",
            "--verbose",
            "--config",
            "/tmp/gamehub.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gamehub.toml")));
        assert!(matches!(cli.command, Commands::Favourite { off: true, .. }));
    }
}
