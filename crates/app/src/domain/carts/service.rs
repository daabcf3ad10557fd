//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::{
    database::Db,
    domain::{
        carts::{
            CartsServiceError, PgCartLinesRepository,
            data::{CartLinePatch, NewCartLine},
            records::{AddonSelection, CartLineRecord, CartLineUuid},
        },
        catalog::{PgCatalogRepository, quote_addon, quote_price, records::ProductUuid},
    },
    identity::CustomerUuid,
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    lines_repository: PgCartLinesRepository,
    catalog_repository: PgCatalogRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            lines_repository: PgCartLinesRepository::new(),
            catalog_repository: PgCatalogRepository::new(),
        }
    }

    async fn validate_addons(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        addons: &[AddonSelection],
    ) -> Result<(), CartsServiceError> {
        let mut seen = FxHashSet::default();

        for selection in addons {
            if !seen.insert(selection.addon_uuid) {
                return Err(CartsServiceError::DuplicateAddon(selection.addon_uuid));
            }

            let addon =
                quote_addon(&self.catalog_repository, tx, product, selection.addon_uuid).await?;

            if selection.quantity == 0 || selection.quantity > addon.max_quantity {
                return Err(CartsServiceError::AddonQuantity {
                    addon: selection.addon_uuid,
                    quantity: selection.quantity,
                    max: addon.max_quantity,
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn add_line(
        &self,
        customer: CustomerUuid,
        line: NewCartLine,
    ) -> Result<CartLineRecord, CartsServiceError> {
        if line.quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let quote = quote_price(
            &self.catalog_repository,
            &mut tx,
            line.product_uuid,
            line.variant_uuid,
        )
        .await?;

        self.validate_addons(&mut tx, line.product_uuid, &line.addons)
            .await?;

        let created = self
            .lines_repository
            .create_cart_line(&mut tx, customer, &line, quote.unit_price)
            .await?;

        tx.commit().await?;

        debug!(%customer, line = %created.uuid, unit_price = created.unit_price, "cart line added");

        Ok(created)
    }

    async fn update_line(
        &self,
        customer: CustomerUuid,
        line: CartLineUuid,
        patch: CartLinePatch,
    ) -> Result<CartLineRecord, CartsServiceError> {
        if patch.quantity == Some(0) {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let mut tx = self.db.begin_transaction().await?;

        let mut record = self
            .lines_repository
            .get_cart_line_for_update(&mut tx, customer, line)
            .await?;

        if patch.is_empty() {
            tx.commit().await?;

            return Ok(record);
        }

        if let Some(addons) = patch.addons {
            self.validate_addons(&mut tx, record.product_uuid, &addons)
                .await?;

            record.addons = addons;
        }

        if let Some(quantity) = patch.quantity {
            record.quantity = quantity;
        }

        if let Some(notes) = patch.notes {
            record.notes = notes;
        }

        if let Some(selected) = patch.selected {
            record.selected = selected;
        }

        let updated = self
            .lines_repository
            .update_cart_line(&mut tx, &record)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn remove_line(
        &self,
        customer: CustomerUuid,
        line: CartLineUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self
            .lines_repository
            .delete_cart_line(&mut tx, customer, line)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self
            .lines_repository
            .list_cart_lines(&mut tx, customer)
            .await?;

        tx.commit().await?;

        Ok(lines)
    }

    async fn list_selected(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self
            .lines_repository
            .list_selected_cart_lines(&mut tx, customer)
            .await?;

        tx.commit().await?;

        Ok(lines)
    }

    async fn refresh_prices(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let lines = self
            .lines_repository
            .list_cart_lines_for_update(&mut tx, customer)
            .await?;

        let mut refreshed = Vec::with_capacity(lines.len());

        for line in lines {
            let quote = quote_price(
                &self.catalog_repository,
                &mut tx,
                line.product_uuid,
                line.variant_uuid,
            )
            .await?;

            if quote.unit_price == line.unit_price {
                refreshed.push(line);
                continue;
            }

            debug!(
                %customer,
                line = %line.uuid,
                from = line.unit_price,
                to = quote.unit_price,
                "cart line repriced"
            );

            refreshed.push(
                self.lines_repository
                    .update_cart_line_price(&mut tx, customer, line.uuid, quote.unit_price)
                    .await?,
            );
        }

        tx.commit().await?;

        Ok(refreshed)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Add a line, capturing the current catalog price.
    async fn add_line(
        &self,
        customer: CustomerUuid,
        line: NewCartLine,
    ) -> Result<CartLineRecord, CartsServiceError>;

    /// Apply a partial update to one of the customer's lines.
    async fn update_line(
        &self,
        customer: CustomerUuid,
        line: CartLineUuid,
        patch: CartLinePatch,
    ) -> Result<CartLineRecord, CartsServiceError>;

    /// Remove one of the customer's lines.
    async fn remove_line(
        &self,
        customer: CustomerUuid,
        line: CartLineUuid,
    ) -> Result<(), CartsServiceError>;

    /// Every line in the customer's cart, oldest first.
    async fn list_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError>;

    /// Lines currently selected for checkout, oldest first.
    async fn list_selected(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError>;

    /// Re-capture every line's unit price from the live catalog.
    async fn refresh_prices(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::catalog::CatalogServiceError,
        test::{
            TestContext,
            helpers::{
                add_line, create_addon, create_product, create_variant, new_line,
                set_product_price,
            },
        },
    };

    use super::*;

    #[tokio::test]
    async fn add_line_captures_variant_price() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let variant = create_variant(&ctx, product, "XL", 17_50).await?;

        let mut line = new_line(product, 2);
        line.variant_uuid = Some(variant);

        let created = ctx.carts.add_line(ctx.customer, line).await?;

        assert_eq!(created.unit_price, 17_50);
        assert_eq!(created.quantity, 2);
        assert_eq!(created.customer_uuid, ctx.customer);
        assert!(created.selected);

        Ok(())
    }

    #[tokio::test]
    async fn add_line_rejects_zero_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;

        let result = ctx.carts.add_line(ctx.customer, new_line(product, 0)).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_line_unknown_product_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .add_line(ctx.customer, new_line(ProductUuid::new(), 1))
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Catalog(
                    CatalogServiceError::ProductNotFound(_)
                ))
            ),
            "expected ProductNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn add_line_validates_addon_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let wrap = create_addon(&ctx, product, "Gift wrap", 2_00, 2).await?;

        let mut line = new_line(product, 1);
        line.addons = vec![AddonSelection {
            addon_uuid: wrap,
            quantity: 3,
        }];

        let result = ctx.carts.add_line(ctx.customer, line).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::AddonQuantity { max: 2, quantity: 3, .. })
            ),
            "expected AddonQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_line_rejects_addon_of_another_product() -> TestResult {
        let ctx = TestContext::new().await;
        let tee = create_product(&ctx, "Tee", 15_00).await?;
        let mug = create_product(&ctx, "Mug", 8_00).await?;
        let wrap = create_addon(&ctx, mug, "Gift wrap", 2_00, 2).await?;

        let mut line = new_line(tee, 1);
        line.addons = vec![AddonSelection {
            addon_uuid: wrap,
            quantity: 1,
        }];

        let result = ctx.carts.add_line(ctx.customer, line).await;

        assert!(
            matches!(result, Err(CartsServiceError::AddonUnavailable(addon)) if addon == wrap),
            "expected AddonUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_line_applies_only_given_fields() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let line = add_line(&ctx, ctx.customer, product, 2).await?;

        let updated = ctx
            .carts
            .update_line(
                ctx.customer,
                line.uuid,
                CartLinePatch {
                    selected: Some(false),
                    notes: Some("no rush".to_string()),
                    ..CartLinePatch::default()
                },
            )
            .await?;

        assert_eq!(updated.quantity, 2);
        assert_eq!(updated.unit_price, 15_00);
        assert_eq!(updated.notes, "no rush");
        assert!(!updated.selected);

        let selected = ctx.carts.list_selected(ctx.customer).await?;

        assert!(selected.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn update_line_rejects_zero_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let line = add_line(&ctx, ctx.customer, product, 2).await?;

        let result = ctx
            .carts
            .update_line(
                ctx.customer,
                line.uuid,
                CartLinePatch {
                    quantity: Some(0),
                    ..CartLinePatch::default()
                },
            )
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_customers_lines_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let line = add_line(&ctx, ctx.customer, product, 1).await?;
        let stranger = CustomerUuid::new();

        let update = ctx
            .carts
            .update_line(
                stranger,
                line.uuid,
                CartLinePatch {
                    quantity: Some(5),
                    ..CartLinePatch::default()
                },
            )
            .await;

        assert!(
            matches!(update, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {update:?}"
        );

        let remove = ctx.carts.remove_line(stranger, line.uuid).await;

        assert!(
            matches!(remove, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {remove:?}"
        );

        assert_eq!(ctx.carts.list_lines(ctx.customer).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn remove_line_deletes_it() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let line = add_line(&ctx, ctx.customer, product, 1).await?;

        ctx.carts.remove_line(ctx.customer, line.uuid).await?;

        assert!(ctx.carts.list_lines(ctx.customer).await?.is_empty());

        let again = ctx.carts.remove_line(ctx.customer, line.uuid).await;

        assert!(
            matches!(again, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn cart_price_is_stable_until_refreshed() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Tee", 15_00).await?;
        let line = add_line(&ctx, ctx.customer, product, 1).await?;

        set_product_price(&ctx, product, 18_00).await?;

        let lines = ctx.carts.list_lines(ctx.customer).await?;

        assert_eq!(lines.first().map(|l| l.unit_price), Some(15_00));

        let refreshed = ctx.carts.refresh_prices(ctx.customer).await?;

        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed.first().map(|l| l.uuid), Some(line.uuid));
        assert_eq!(refreshed.first().map(|l| l.unit_price), Some(18_00));

        Ok(())
    }
}
