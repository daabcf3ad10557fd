//! Checkout service.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use kasa::{
    orders::{AssemblyError, OrderDetails, OrderDraft, assemble},
    pricing::{AddonQuote, LineAddon, LineInput, PricingEngine, PricingError},
};
use mockall::automock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sqlx::{Acquire, Postgres, Transaction};
use tokio::time::timeout;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    database::{Db, violates_constraint},
    domain::{
        carts::{PgCartLinesRepository, records::CartLineRecord},
        catalog::{CatalogServiceError, PgCatalogRepository, quote_addon, quote_price},
        checkout::{CheckoutError, CheckoutSettings, PersistenceError},
        orders::{OrderNumberGenerator, PgOrdersRepository, records::OrderRecord},
    },
    identity::CustomerUuid,
    retry::retry_on_transient,
};

const ORDER_NUMBER_CONSTRAINT: &str = "orders_order_number_key";

/// What the customer supplies at checkout. Lines come from the cart selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub details: OrderDetails,
}

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts_repository: PgCartLinesRepository,
    catalog_repository: PgCatalogRepository,
    orders_repository: PgOrdersRepository,
    engine: PricingEngine,
    settings: CheckoutSettings,
    numbers: Arc<dyn OrderNumberGenerator>,
}

impl fmt::Debug for PgCheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgCheckoutService")
            .field("engine", &self.engine)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(
        db: Db,
        engine: PricingEngine,
        settings: CheckoutSettings,
        numbers: Arc<dyn OrderNumberGenerator>,
    ) -> Self {
        Self {
            db,
            carts_repository: PgCartLinesRepository::new(),
            catalog_repository: PgCatalogRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            engine,
            settings,
            numbers,
        }
    }

    async fn checkout_once(
        &self,
        customer: CustomerUuid,
        request: &CheckoutRequest,
        attempt: u32,
    ) -> Result<OrderRecord, CheckoutError> {
        let mut tx = self
            .db
            .begin_unit_of_work(self.settings.transaction_timeout)
            .await?;

        let lines = self
            .carts_repository
            .lock_selected_cart_lines(&mut tx, customer)
            .await?;

        if lines.is_empty() {
            return Err(CheckoutError::EmptySelection);
        }

        let (inputs, addon_quotes) = self.resolve_lines(&mut tx, &lines).await?;

        let priced = self
            .engine
            .price(&inputs, &addon_quotes)
            .map_err(pricing_error)?;

        let draft = assemble(
            customer.into_uuid(),
            request.details.clone(),
            priced,
            self.numbers.next(customer, Timestamp::now()),
        )
        .map_err(assembly_error)?;

        let order = self.insert_order(&mut tx, customer, draft).await?;

        let consumed: Vec<_> = lines.iter().map(|line| line.uuid).collect();

        let deleted = self
            .carts_repository
            .delete_cart_lines(&mut tx, customer, &consumed)
            .await?;

        if usize::try_from(deleted).ok() != Some(consumed.len()) {
            return Err(PersistenceError::Conflict.into());
        }

        tx.commit().await?;

        info!(
            %customer,
            order = %order.uuid,
            order_number = %order.order_number,
            total = order.total,
            lines = order.lines.len(),
            attempt,
            "order placed"
        );

        Ok(order)
    }

    /// Re-read the catalog for every locked line and collect pricing inputs.
    async fn resolve_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lines: &[CartLineRecord],
    ) -> Result<(Vec<LineInput>, FxHashMap<Uuid, AddonQuote>), CheckoutError> {
        let mut inputs = Vec::with_capacity(lines.len());
        let mut addon_quotes = FxHashMap::default();

        for line in lines {
            let quote = quote_price(
                &self.catalog_repository,
                tx,
                line.product_uuid,
                line.variant_uuid,
            )
            .await
            .map_err(|error| match error {
                CatalogServiceError::VariantNotFound { variant, .. } => {
                    CheckoutError::VariantNotFound {
                        line: line.uuid,
                        variant,
                    }
                }
                CatalogServiceError::Sql(error) => CheckoutError::from(error),
                CatalogServiceError::ProductNotFound(_)
                | CatalogServiceError::AddonNotFound { .. } => CheckoutError::ProductNotFound {
                    line: line.uuid,
                    product: line.product_uuid,
                },
            })?;

            if quote.unit_price.abs_diff(line.unit_price) > self.settings.price_tolerance {
                return Err(CheckoutError::PriceChanged {
                    line: line.uuid,
                    cart_price: line.unit_price,
                    current_price: quote.unit_price,
                });
            }

            let mut addons = SmallVec::new();

            for selection in &line.addons {
                let addon = quote_addon(
                    &self.catalog_repository,
                    tx,
                    line.product_uuid,
                    selection.addon_uuid,
                )
                .await
                .map_err(|error| match error {
                    CatalogServiceError::Sql(error) => CheckoutError::from(error),
                    _ => CheckoutError::AddonPricingUnavailable {
                        line: line.uuid,
                        addon: selection.addon_uuid,
                    },
                })?;

                addon_quotes.insert(
                    addon.uuid.into_uuid(),
                    AddonQuote {
                        name: addon.name,
                        unit_price: addon.price,
                    },
                );

                addons.push(LineAddon {
                    addon: selection.addon_uuid.into_uuid(),
                    quantity: selection.quantity,
                });
            }

            inputs.push(LineInput {
                product: line.product_uuid.into_uuid(),
                variant: quote.variant_uuid.map(|variant| variant.into_uuid()),
                product_name: quote.product_name,
                variant_name: quote.variant_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                addons,
            });
        }

        Ok((inputs, addon_quotes))
    }

    /// Insert the order, asking for a fresh number whenever the current one is taken.
    async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        mut draft: OrderDraft,
    ) -> Result<OrderRecord, CheckoutError> {
        let attempts = self.settings.order_number_attempts.max(1);

        for attempt in 1..=attempts {
            let mut savepoint = Acquire::begin(&mut **tx).await?;

            match self
                .orders_repository
                .create_order(&mut savepoint, &draft)
                .await
            {
                Ok(order) => {
                    savepoint.commit().await?;

                    return Ok(order);
                }
                Err(error) if violates_constraint(&error, ORDER_NUMBER_CONSTRAINT) => {
                    savepoint.rollback().await?;

                    warn!(
                        %customer,
                        order_number = %draft.order_number(),
                        attempt,
                        "order number already taken"
                    );

                    draft.renumber(self.numbers.next(customer, Timestamp::now()));
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(PersistenceError::OrderNumberCollision { attempts }.into())
    }
}

fn pricing_error(error: PricingError) -> CheckoutError {
    match error {
        PricingError::NoLines => CheckoutError::EmptySelection,
        PricingError::Overflow => CheckoutError::InvalidRequest(error.to_string()),
        _ => integrity_violation(&error),
    }
}

fn assembly_error(error: AssemblyError) -> CheckoutError {
    match error {
        AssemblyError::MissingField(_) => CheckoutError::InvalidRequest(error.to_string()),
        _ => integrity_violation(&error),
    }
}

fn integrity_violation(error: &dyn std::error::Error) -> CheckoutError {
    error!(%error, "checkout integrity violation");

    CheckoutError::IntegrityViolation(error.to_string())
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    async fn checkout(
        &self,
        customer: CustomerUuid,
        request: CheckoutRequest,
    ) -> Result<OrderRecord, CheckoutError> {
        request
            .details
            .validate()
            .map_err(|error| CheckoutError::InvalidRequest(error.to_string()))?;

        let request = &request;
        let limit = self.settings.transaction_timeout;

        let result = retry_on_transient(self.settings.retry, |attempt| async move {
            match timeout(limit, self.checkout_once(customer, request, attempt)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(PersistenceError::Timeout(limit).into()),
            }
        })
        .await;

        if let Err(CheckoutError::IntegrityViolation(_)) = &result {
            error!(%customer, "checkout aborted");
        }

        result
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Turn the customer's selected cart lines into a pending order.
    ///
    /// Either the order, its lines and the removal of the consumed cart lines are all
    /// committed, or nothing is.
    async fn checkout(
        &self,
        customer: CustomerUuid,
        request: CheckoutRequest,
    ) -> Result<OrderRecord, CheckoutError>;
}
