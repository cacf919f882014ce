//! RAMM Shop CLI - browse, sell and moderate from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account, confirm it and sign in
//! ramm signup -e jane@example.com -r seller
//! ramm confirm -e jane@example.com -c 123456
//! ramm login -e jane@example.com
//!
//! # Sell something
//! ramm add-product -n "Oak desk" -p 120 -c furniture --image desk.jpg
//!
//! # Buy something
//! ramm search -m category lamps
//! ramm products buy 42
//! ramm orders checkout --product-id 42 --seller-id <seller>
//! ramm finalize "http://localhost:5173/ordersuccess?buyer_id=..&seller_id=..&product_id=42"
//!
//! # Moderate
//! ramm admin listings
//! ramm admin toggle 42
//! ```
//!
//! # Environment Variables
//!
//! Everything `ramm-client` reads (see `ClientConfig`), plus:
//! - `SENTRY_DSN` - Error tracking (optional)
//! - `SENTRY_ENVIRONMENT` - Error tracking environment name (optional)
//! - `RAMM_LOG_FORMAT` - `json` for structured logs on stderr (default: text)
//! - `RUST_LOG` - Log filter (default: `ramm_client=info,ramm_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ramm_client::listings::SearchMode;
use ramm_core::{IdError, ListingId, Role};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod prompt;
mod render;

use context::Context;

#[derive(Parser)]
#[command(name = "ramm")]
#[command(author, version, about = "RAMM Shop marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "RAMM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "RAMM_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// `buyer` or `seller`
        #[arg(short, long, default_value = "buyer")]
        role: Role,
    },
    /// Confirm an account with the emailed code
    Confirm {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, default_value = "")]
        code: String,
    },
    /// Forget the local session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse and manage listings
    Products {
        #[command(subcommand)]
        action: Option<ProductsAction>,
    },
    /// Create a listing with an image
    AddProduct {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: String,

        #[arg(short, long, default_value = "")]
        category: String,

        /// Seller id (defaults to the signed-in user)
        #[arg(long)]
        seller_id: Option<String>,

        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Search listings
    Search {
        /// `product_id`, `name`, `category`, `seller_id` or `price_range`
        #[arg(short, long, default_value = "name")]
        mode: SearchMode,

        /// Search term (not used for `price_range`)
        #[arg(default_value = "")]
        term: String,

        #[arg(long, default_value = "")]
        min_price: String,

        #[arg(long, default_value = "")]
        max_price: String,
    },
    /// Order history and checkout
    Orders {
        #[command(subcommand)]
        action: Option<OrdersAction>,
    },
    /// Finalize an order from the payment return URL
    Finalize {
        url: String,

        /// Do not wait for the redirect delay
        #[arg(long)]
        no_wait: bool,
    },
    /// Administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Open a route by path or URL
    Open { target: String },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products visible to you
    List,
    /// Update the changed fields of one of your products
    Update {
        #[arg(value_parser = parse_id)]
        id: ListingId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        image_key: Option<String>,
    },
    /// Delete one of your products
    Delete {
        #[arg(value_parser = parse_id)]
        id: ListingId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start buying a product
    Buy {
        #[arg(value_parser = parse_id)]
        id: ListingId,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Open a payment checkout for a product
    Checkout {
        #[arg(long, value_parser = parse_id)]
        product_id: ListingId,

        #[arg(long)]
        seller_id: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List users
    Users,
    /// List every listing with its moderation action
    Listings,
    /// Remove or keep a listing
    Toggle {
        #[arg(value_parser = parse_id)]
        id: ListingId,
    },
}

fn parse_id(input: &str) -> Result<ListingId, IdError> {
    ListingId::parse_positive(input)
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ramm_client=info,ramm_cli=info".into());

    // Logs go to stderr; stdout carries the rendered output
    let json = std::env::var("RAMM_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Sentry before the subscriber so the tracing layer has a client
    let _sentry_guard = init_sentry();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load()?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, email, password).await?;
        }
        Commands::Signup {
            email,
            password,
            role,
        } => commands::auth::signup(&ctx, &email, password, role).await?,
        Commands::Confirm { email, code } => commands::auth::confirm(&ctx, &email, &code).await?,
        Commands::Logout => commands::auth::logout(&ctx)?,
        Commands::Whoami => commands::auth::whoami(&ctx)?,
        Commands::Products { action } => match action.unwrap_or(ProductsAction::List) {
            ProductsAction::List => commands::listings::list(&ctx).await?,
            ProductsAction::Update {
                id,
                name,
                category,
                price,
                description,
                image_key,
            } => {
                let changes = commands::listings::Changes {
                    name,
                    category,
                    price,
                    description,
                    image_key,
                };
                commands::listings::update(&ctx, id, changes).await?;
            }
            ProductsAction::Delete { id, yes } => commands::listings::delete(&ctx, id, yes).await?,
            ProductsAction::Buy { id } => commands::listings::buy(&ctx, id).await?,
        },
        Commands::AddProduct {
            name,
            price,
            category,
            seller_id,
            image,
        } => {
            let draft = commands::listings::NewListing {
                name,
                price,
                category,
                seller_id,
                image,
            };
            commands::listings::add(&ctx, draft).await?;
        }
        Commands::Search {
            mode,
            term,
            min_price,
            max_price,
        } => {
            let form = ramm_client::listings::SearchForm {
                mode,
                term,
                min_price,
                max_price,
            };
            commands::listings::search(&ctx, &form).await?;
        }
        Commands::Orders { action } => match action.unwrap_or(OrdersAction::List) {
            OrdersAction::List => commands::orders::list(&ctx).await?,
            OrdersAction::Checkout {
                product_id,
                seller_id,
            } => commands::orders::checkout(&ctx, product_id, &seller_id).await?,
        },
        Commands::Finalize { url, no_wait } => commands::orders::finalize(&ctx, &url, !no_wait).await?,
        Commands::Admin { action } => match action {
            AdminAction::Users => commands::admin::users(&ctx).await?,
            AdminAction::Listings => commands::admin::listings(&ctx).await?,
            AdminAction::Toggle { id } => commands::admin::toggle(&ctx, id).await?,
        },
        Commands::Open { target } => commands::open(&ctx, &target).await?,
    }
    Ok(())
}
