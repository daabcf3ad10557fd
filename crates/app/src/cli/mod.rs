use clap::{Parser, Subcommand};
use kasa_app::{
    config::{CheckoutConfig, DatabaseConfig, LoggingConfig},
    context::AppContext,
};

mod cart;
mod checkout;
mod migrate;
mod order;
mod principal;
mod print;

#[derive(Debug, Parser)]
#[command(name = "kasa-app", about = "Kasa checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    checkout: CheckoutConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage cart lines
    Cart(cart::CartCommand),
    /// Turn the selected cart lines into an order
    Checkout(checkout::CheckoutArgs),
    /// Inspect and transition orders
    Order(order::OrderCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        if let Commands::Migrate = self.command {
            return migrate::run(&self.database).await;
        }

        let currency = self
            .checkout
            .currency()
            .map_err(|error| format!("invalid configuration: {error}"))?;

        let ctx = AppContext::from_config(&self.database, &self.checkout)
            .await
            .map_err(|error| format!("failed to initialise: {error}"))?;

        match self.command {
            Commands::Migrate => Ok(()),
            Commands::Cart(command) => cart::run(&ctx, currency, command).await,
            Commands::Checkout(args) => checkout::run(&ctx, currency, args).await,
            Commands::Order(command) => order::run(&ctx, currency, command).await,
        }
    }
}
