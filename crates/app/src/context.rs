//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{CheckoutConfig, ConfigError, DatabaseConfig},
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        catalog::{CatalogReader, PgCatalogReader},
        checkout::{CheckoutService, PgCheckoutService},
        orders::{OrdersService, PgOrdersService, TimestampOrderNumbers},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("invalid checkout configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Service handles shared by every entry point.
#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogReader>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the checkout settings are invalid or establishing a database
    /// connection fails.
    pub async fn from_config(
        database: &DatabaseConfig,
        checkout: &CheckoutConfig,
    ) -> Result<Self, AppInitError> {
        let engine = checkout.pricing_engine()?;
        let settings = checkout.settings()?;

        let pool = database::connect(&database.database_url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        Ok(Self {
            catalog: Arc::new(PgCatalogReader::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            checkout: Arc::new(PgCheckoutService::new(
                db,
                engine,
                settings,
                Arc::new(TimestampOrderNumbers),
            )),
        })
    }
}
