//! Casa del Pan CLI - terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! bakery catalog --category panes --page 2
//!
//! # Fill the cart
//! bakery cart add 12 -q 3
//! bakery cart show
//!
//! # Check out with a token from the card widget
//! bakery checkout --street "Av. Larco 345" --zip-code 15074 --phone 987654321 \
//!     --payment-token pm_1Pq...
//!
//! # Order history
//! bakery orders list
//! ```
//!
//! # Commands
//!
//! - `catalog` - List products
//! - `product` - Show one product
//! - `cart` - Show or change the cart
//! - `checkout` - Place an order for the cart
//! - `orders` - Order history

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use bakery_core::PaymentMethod;
use bakery_storefront::config::StorefrontConfig;
use bakery_storefront::state::AppState;
use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "bakery")]
#[command(author, version, about = "Casa del Pan storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Catalog {
        /// Page number (1-based)
        #[arg(long)]
        page: Option<u32>,

        /// Products per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Category slug
        #[arg(long)]
        category: Option<String>,

        /// Search text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Product {
        /// Product id
        id: String,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(CheckoutArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show items, totals and the free-shipping hint
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a quantity (0 removes the product)
    Set {
        /// Product id
        id: String,

        /// New quantity
        quantity: i64,
    },
    /// Remove a product
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show {
        /// Order id
        id: String,
    },
}

#[derive(Args)]
struct CheckoutArgs {
    /// Street and number
    #[arg(long)]
    street: String,

    /// Postal code
    #[arg(long)]
    zip_code: String,

    /// Contact phone
    #[arg(long)]
    phone: String,

    /// Payment method (`card`, `stripe`)
    #[arg(long, default_value = "card")]
    method: PaymentMethod,

    /// Payment-method token from the card widget
    #[arg(long)]
    payment_token: String,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment (needed for Sentry init)
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout is for command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bakery_storefront=info,bakery_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let CommandError::Storefront(err) = &e {
                err.report();
            }
            let _ = writeln!(std::io::stderr(), "{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CommandError> {
    let state = AppState::new(config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Catalog {
            page,
            page_size,
            category,
            search,
        } => {
            let query = bakery_storefront::api::ProductQuery {
                page,
                page_size,
                category,
                search,
            };
            commands::catalog::list(&state, &query, &mut out).await?;
        }
        Commands::Product { id } => commands::catalog::show(&state, &id, &mut out).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state, &mut out)?,
            CartAction::Add { id, quantity } => {
                commands::cart::add(&state, &id, quantity, &mut out).await?;
            }
            CartAction::Set { id, quantity } => {
                commands::cart::set(&state, &id, quantity, &mut out)?;
            }
            CartAction::Remove { id } => commands::cart::remove(&state, &id, &mut out)?,
            CartAction::Clear => commands::cart::clear(&state, &mut out)?,
        },
        Commands::Checkout(args) => {
            let request = commands::checkout::CheckoutRequest {
                street: args.street,
                zip_code: args.zip_code,
                phone: args.phone,
                method: args.method,
                payment_token: args.payment_token,
            };
            commands::checkout::run(&state, request, &mut out).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&state, &mut out).await?,
            OrdersAction::Show { id } => commands::orders::show(&state, &id, &mut out).await?,
        },
    }
    Ok(())
}
