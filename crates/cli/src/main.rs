//! Stockyard CLI - migrations, quotes and order management.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! sy-cli migrate sessions
//!
//! # Price a cart file with express shipping
//! sy-cli quote --cart cart.json --shipping express
//!
//! # Mark an order as shipped
//! sy-cli orders set-status --company 3 --order 1042 --status shipped
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use stockyard_core::{CompanyId, OrderId, OrderStatus, PaymentStatus, ShippingMethod};

mod commands;

#[derive(Parser)]
#[command(name = "sy-cli")]
#[command(author, version, about = "Stockyard CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Print totals for a JSON list of cart lines
    Quote {
        /// Path to the cart lines file
        #[arg(short, long)]
        cart: PathBuf,

        /// Shipping method (free, standard, express)
        #[arg(short, long, default_value = "standard")]
        shipping: ShippingMethod,

        /// Print the totals as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage orders through the records API
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the storefront session table
    Sessions,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Set an order's status and/or payment status
    SetStatus {
        /// Company ID
        #[arg(long)]
        company: CompanyId,

        /// Order ID
        #[arg(long)]
        order: OrderId,

        /// New order status
        #[arg(long)]
        status: Option<OrderStatus>,

        /// New payment status
        #[arg(long)]
        payment: Option<PaymentStatus>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockyard_cli=info,stockyard_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Quote {
            cart,
            shipping,
            json,
        } => commands::quote::run(&cart, shipping, json)?,
        Commands::Orders { action } => match action {
            OrdersAction::SetStatus {
                company,
                order,
                status,
                payment,
            } => commands::orders::set_status(company, order, status, payment).await?,
        },
    }
    Ok(())
}
