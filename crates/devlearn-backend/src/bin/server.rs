//! Document server binary
//!
//! Run with: cargo run -p devlearn-backend --bin devlearn-server

use std::path::PathBuf;

use clap::Parser;
use devlearn_backend::{config::AppConfig, server::DocServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DevLearn document upload server
#[derive(Parser, Debug)]
#[command(name = "devlearn-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "DEVLEARN_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for uploaded files
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.upload_dir {
            config.storage.upload_dir = dir;
        }
        if let Some(path) = self.database {
            config.database.path = path;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devlearn_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env()?;
    args.apply(&mut config);
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Upload directory: {}", config.storage.upload_dir.display());
    tracing::info!("  - Database: {}", config.database.path.display());
    tracing::info!("  - Max upload size: {} bytes", config.server.max_upload_size);

    let server = DocServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST  /api/documents/upload      - Upload a PDF or PPTX file");
    println!("  GET   /api/documents             - List documents");
    println!("  GET   /api/documents/:id         - Fetch one document");
    println!("  PATCH /api/documents/:id/status  - Update processing status");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
