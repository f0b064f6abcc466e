//! PointSync CLI - Main entry point for the sync service binary
//!
//! `pointsync serve` boots the HTTP API; `status` and `backups` inspect the
//! store without starting a server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pointsync::engine::{
    api::{create_router, ApiState},
    auth::ApiKeys,
    config::{Config, CONFIG_FILE},
    store::DocumentStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pointsync")]
#[command(version)]
#[command(about = "Cloud sync service for the points system", long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory when it holds a
    /// config file, otherwise ~/.pointsync)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the sync API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Show document and backup status
    Status,

    /// List backup snapshots
    Backups,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let project_dir = resolve_project_dir(cli.project)?;
    let json_output = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Serve { port, host } => cmd_serve(&project_dir, host, port),
        Commands::Status => cmd_status(&project_dir, json_output),
        Commands::Backups => cmd_backups(&project_dir, json_output),
    }
}

fn resolve_project_dir(cli_project: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = cli_project {
        return Ok(dir);
    }

    let cwd = std::env::current_dir()?;
    if cwd.join(CONFIG_FILE).exists() {
        return Ok(cwd);
    }

    let home_dir = dirs::home_dir().context("Could not find home directory")?;
    Ok(home_dir.join(".pointsync"))
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pointsync=info,tower_http=info")),
        )
        .init();
}

fn open_store(project_dir: &Path, config: &Config) -> anyhow::Result<DocumentStore> {
    let data_file = project_dir.join(&config.storage.data_file);
    let backup_dir = project_dir.join(&config.storage.backup_dir);
    Ok(DocumentStore::new(&data_file, &backup_dir)?)
}

#[tokio::main]
async fn cmd_serve(
    project_dir: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load_or_default(project_dir)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let store = open_store(project_dir, &config)?;
    let auth = ApiKeys::new(
        config.auth.api_keys.values().cloned().collect(),
        config.auth.require_auth,
    );

    let state = ApiState {
        store: Arc::new(store),
        auth: Arc::new(auth),
        static_dir: project_dir.join(&config.storage.static_dir),
    };

    let addr = format!("{}:{}", host, port);
    println!("🚀 PointSync API Server");
    println!("   Data file: {}", state.store.data_file().display());
    println!("   Backups:   {}", state.store.backup_dir().display());
    if config.auth.api_keys.is_empty() {
        println!("   API keys:  (none configured)");
    } else {
        let mut names: Vec<&str> = config.auth.api_keys.keys().map(String::as_str).collect();
        names.sort_unstable();
        println!("   API keys:  {}", names.join(", "));
    }
    println!("   Listening: http://{}", addr);
    println!("   Press Ctrl+C to stop");

    let app = create_router(state);

    info!("starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cmd_status(project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(project_dir)?;
    let store = open_store(project_dir, &config)?;

    let document_size = std::fs::metadata(store.data_file()).map(|m| m.len()).ok();
    let backups = store.list_backups()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "data_file": store.data_file().display().to_string(),
                "document_exists": document_size.is_some(),
                "document_size": document_size,
                "backup_count": backups.len(),
                "api_keys": config.auth.api_keys.len(),
                "require_auth": config.auth.require_auth,
            })
        );
    } else {
        println!("📊 PointSync Status");
        println!("   Data file: {}", store.data_file().display());
        match document_size {
            Some(size) => println!("   Document:  {} bytes", size),
            None => println!("   Document:  (none stored yet)"),
        }
        println!("   Backups:   {}", backups.len());
        println!(
            "   Auth:      {} key(s), require_auth: {}",
            config.auth.api_keys.len(),
            config.auth.require_auth
        );
    }

    Ok(())
}

fn cmd_backups(project_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(project_dir)?;
    let store = open_store(project_dir, &config)?;
    let backups = store.list_backups()?;

    if json {
        println!("{}", serde_json::json!({ "backups": backups }));
    } else {
        println!("📋 Backup Snapshots:");
        if backups.is_empty() {
            println!("   (none)");
        } else {
            for backup in &backups {
                println!(
                    "   {}  {}  {} bytes",
                    backup.timestamp, backup.filename, backup.size
                );
            }
        }
    }

    Ok(())
}
