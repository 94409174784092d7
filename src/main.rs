//! Viewcount CLI
//!
//! Command-line interface for the view counter:
//! - Simulate a page visit (and keep it open)
//! - Show a page's stored count
//! - Format a number the way pages display it
//! - Generate a config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use viewcount::config::{generate_default_config, Config, LoggingConfig};
use viewcount::counter::{format_views, render_text, PageContext, PageSession, TokioScheduler};
use viewcount::render::{HtmlDocument, MemoryDocument, Renderer};
use viewcount::storage::{FileStore, KeyValueStore, PageId, ViewStore};

#[derive(Parser)]
#[command(name = "viewcount")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthetic page view counter backed by a local store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding the configured one
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a page: count the visit, catch up, and optionally keep it open
    Visit {
        /// Page path, used verbatim as the store key
        path: String,
        /// Keep the page open for this many seconds (Ctrl-C closes early)
        #[arg(short, long)]
        watch: Option<u64>,
        /// HTML file to render the count into
        #[arg(long)]
        html: Option<PathBuf>,
        /// Seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show a page's stored count without changing it
    Show {
        /// Page path
        path: String,
    },

    /// Format a view count
    Format {
        /// Number of views
        views: u64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default()?,
    };
    if let Some(data_file) = &cli.data_file {
        config.store.data_file = data_file.to_string_lossy().to_string();
    }

    init_logging(&config.logging);

    match cli.command {
        Commands::Visit {
            path,
            watch,
            html,
            seed,
        } => visit(&config, path, watch, html, seed).await?,

        Commands::Show { path } => show(&config, path)?,

        Commands::Format { views } => println!("{}", format_views(views)),

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("viewcount={}", config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let data_path = config.store.data_path();
    tracing::debug!("Store file: {:?}", data_path);

    let store = FileStore::open(&data_path)
        .with_context(|| format!("opening store {}", data_path.display()))?;
    Ok(Arc::new(store))
}

async fn visit(
    config: &Config,
    path: String,
    watch: Option<u64>,
    html: Option<PathBuf>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let selector = config.selector()?;
    let page = PageId::new(path);

    let renderer: Arc<dyn Renderer> = match html {
        Some(file) => Arc::new(HtmlDocument::new(file)?),
        None => Arc::new(MemoryDocument::with_element(&selector)),
    };

    let mut context = PageContext::new(store.clone(), page.clone(), renderer)
        .policy(config.increment_policy()?)
        .selector(selector)
        .suffix(config.render.suffix.clone());
    if let Some(seed) = seed {
        context = context.seed(seed);
    }

    let session = PageSession::open(context, Arc::new(TokioScheduler))?;

    let reload = session.reload();
    let catch_up = session.catch_up();
    tracing::info!(
        "Reload +{} ({} ms since last), catch-up +{} ({} intervals)",
        reload.increment,
        reload.elapsed_ms,
        catch_up.increment,
        catch_up.intervals
    );
    println!(
        "{}: {}",
        page,
        render_text(session.opening_views(), &config.render.suffix)
    );

    if let Some(secs) = watch {
        tracing::info!("Keeping {} open for {}s", page, secs);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
            }
        }
    }

    session.close().await?;

    if watch.is_some() {
        let views = ViewStore::new(store, page.clone())
            .peek_views()?
            .unwrap_or_default();
        println!("{}: {}", page, render_text(views, &config.render.suffix));
    }

    Ok(())
}

fn show(config: &Config, path: String) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let views = ViewStore::new(store, PageId::new(path));

    match views.peek_views()? {
        Some(count) => println!(
            "{}: {} ({})",
            views.page(),
            render_text(count, &config.render.suffix),
            count
        ),
        None => {
            println!("{}: no views recorded", views.page());
            return Ok(());
        }
    }

    let describe = |ts: Option<i64>| {
        ts.and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| "never".to_string())
    };
    println!("  last reload: {}", describe(views.last_reload()?));
    println!("  last update: {}", describe(views.last_update()?));

    Ok(())
}
