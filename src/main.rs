//! CLI entry point for pistlar

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pistlar::config::SiteConfig;
use pistlar::Blog;

#[derive(Parser)]
#[command(name = "pistlar")]
#[command(version)]
#[command(about = "A markdown blog server", long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Refresh posts when files change
        #[arg(short, long)]
        watch: bool,
    },

    /// List posts or tags
    List {
        /// Type of content to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Load every post and report files that fail
    Check,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "pistlar=debug,info"
    } else {
        "pistlar=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Commands::Version = cli.command {
        println!("pistlar version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = SiteConfig::resolve(cli.config.as_deref()).context("Invalid configuration")?;
    let blog = Blog::from_config(config)?;

    match cli.command {
        Commands::Serve { port, ip, watch } => {
            tracing::info!("Starting server at http://{}:{}", ip, port);
            pistlar::server::start(Arc::new(blog), &ip, port, watch).await?;
        }

        Commands::List { r#type } => {
            pistlar::commands::list::run(&blog, &r#type)?;
        }

        Commands::Check => {
            if !pistlar::commands::check::run(&blog)? {
                std::process::exit(1);
            }
        }

        Commands::Version => {}
    }

    Ok(())
}
