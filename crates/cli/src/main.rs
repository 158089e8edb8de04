//! QKart CLI - browse, search and manage the cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! qkart products
//!
//! # Search (simulating typing one keystroke every 100ms)
//! qkart search phone --keystroke-ms 100
//!
//! # Show the cart of the logged-in user
//! qkart cart show
//!
//! # Add a product / change its quantity
//! qkart cart add KCRwjF7lN97HnEaY
//! qkart cart set KCRwjF7lN97HnEaY 3
//! ```
//!
//! # Environment Variables
//!
//! See `qkart_storefront::config`. The session token is read from the JSON
//! file named by `QKART_TOKEN_FILE` (or `--token-file`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use qkart_storefront::config::ConfigError;
use qkart_storefront::session::TokenStoreError;
use qkart_storefront::{
    ApiError, BackendClient, CartError, FileTokenStore, MemoryTokenStore, Notifier,
    SessionContext, Storefront, StorefrontConfig,
};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront CLI")]
struct Cli {
    /// Backend API base URL (overrides `QKART_API_ENDPOINT`)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Token store file (overrides `QKART_TOKEN_FILE`)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Search the catalog
    Search {
        /// Text to search for
        text: String,

        /// Type the text one character at a time with this delay
        #[arg(long)]
        keystroke_ms: Option<u64>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product (refused if already in the cart)
    Add {
        /// Product ID
        product_id: String,
    },
    /// Set the quantity of a product in the cart (0 removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        quantity: u32,
    },
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("Backend client error: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_storefront=warn,qkart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig, ConfigError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint)?;
    }
    if let Some(path) = &cli.token_file {
        config.token_file = Some(path.clone());
    }
    Ok(config)
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), CliError> {
    let context = match &config.token_file {
        Some(path) => SessionContext::from_store(&FileTokenStore::load(path)?),
        None => SessionContext::from_store(&MemoryTokenStore::new()),
    };

    let api = Arc::new(BackendClient::new(&config)?);
    let (notifier, mut notices) = Notifier::channel();
    let storefront = Storefront::open(api, context, &config, notifier).await;

    let result = match command {
        Commands::Products => commands::products::list(&storefront),
        Commands::Search { text, keystroke_ms } => {
            commands::search::run(&storefront, &text, keystroke_ms).await
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront),
            CartAction::Add { product_id } => commands::cart::add(&storefront, &product_id).await,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&storefront, &product_id, quantity).await,
        },
    };

    // Notices were produced along the way; show them before any final error.
    drop(storefront);
    commands::print_notices(&mut notices)?;

    result
}
