//! Orders service.
//!
//! Reads and lifecycle transitions for placed orders. Creation happens in checkout.

use async_trait::async_trait;
use jiff::Timestamp;
use kasa::orders::{InvalidTransition, OrderTransition};
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::orders::{
        OrdersServiceError, PgOrdersRepository,
        records::{OrderRecord, OrderUuid},
    },
    identity::{CustomerUuid, SystemIdentity},
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }

    async fn transition(
        &self,
        order: OrderUuid,
        customer: Option<CustomerUuid>,
        transition: OrderTransition,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.repository.get_order(&mut tx, order, customer).await?;
        let next = current.lifecycle().apply(transition, Timestamp::now())?;

        let Some(updated) = self
            .repository
            .transition_order(&mut tx, order, current.status, next)
            .await?
        else {
            // Lost a race: report against whatever status won.
            let winner = self.repository.get_order(&mut tx, order, customer).await?;

            return Err(InvalidTransition {
                from: winner.status,
                transition,
            }
            .into());
        };

        tx.commit().await?;

        info!(
            order = %updated.uuid,
            order_number = %updated.order_number,
            from = %current.status,
            to = %updated.status,
            "order transitioned"
        );

        Ok(updated)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn get_order(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self
            .repository
            .get_order(&mut tx, order, Some(customer))
            .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_orders(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.repository.list_orders(&mut tx, customer).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn cancel(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.transition(order, Some(customer), OrderTransition::Cancel)
            .await
    }

    async fn mark_paid(
        &self,
        system: &SystemIdentity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        info!(%system, %order, "marking order paid");

        self.transition(order, None, OrderTransition::MarkPaid).await
    }

    async fn complete(
        &self,
        system: &SystemIdentity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        info!(%system, %order, "completing order");

        self.transition(order, None, OrderTransition::Complete).await
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve one of the customer's orders.
    async fn get_order(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The customer's orders, newest first.
    async fn list_orders(&self, customer: CustomerUuid)
    -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Cancel a pending order on behalf of its customer.
    async fn cancel(
        &self,
        customer: CustomerUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Record payment for a pending order.
    async fn mark_paid(
        &self,
        system: &SystemIdentity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Mark a paid order as fulfilled.
    async fn complete(
        &self,
        system: &SystemIdentity,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use kasa::orders::{OrderStatus, PaymentStatus};
    use testresult::TestResult;

    use crate::test::{
        TestContext,
        helpers::{place_order, system},
    };

    use super::*;

    #[tokio::test]
    async fn cancel_pending_order() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;

        let cancelled = ctx.orders.cancel(ctx.customer, order.uuid).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.canceled_at.is_some());
        assert_eq!(cancelled.total, order.total);
        assert_eq!(cancelled.lines, order.lines);

        Ok(())
    }

    #[tokio::test]
    async fn mark_paid_then_complete() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;

        let paid = ctx.orders.mark_paid(&system(), order.uuid).await?;

        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());

        let completed = ctx.orders.complete(&system(), order.uuid).await?;

        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.paid_at, paid.paid_at);

        Ok(())
    }

    #[tokio::test]
    async fn cancel_completed_order_is_rejected_and_leaves_it_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;

        ctx.orders.mark_paid(&system(), order.uuid).await?;
        let completed = ctx.orders.complete(&system(), order.uuid).await?;

        let result = ctx.orders.cancel(ctx.customer, order.uuid).await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidTransition(InvalidTransition {
                    from: OrderStatus::Completed,
                    transition: OrderTransition::Cancel,
                }))
            ),
            "expected InvalidTransition, got {result:?}"
        );

        let reloaded = ctx.orders.get_order(ctx.customer, order.uuid).await?;

        assert_eq!(reloaded, completed);

        Ok(())
    }

    #[tokio::test]
    async fn complete_requires_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;

        let result = ctx.orders.complete(&system(), order.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_customers_orders_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;
        let stranger = CustomerUuid::new();

        let get = ctx.orders.get_order(stranger, order.uuid).await;

        assert!(
            matches!(get, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {get:?}"
        );

        let cancel = ctx.orders.cancel(stranger, order.uuid).await;

        assert!(
            matches!(cancel, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {cancel:?}"
        );

        assert!(ctx.orders.list_orders(stranger).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_newest_first() -> TestResult {
        let ctx = TestContext::new().await;
        let first = place_order(&ctx).await?;
        let second = place_order(&ctx).await?;

        let orders = ctx.orders.list_orders(ctx.customer).await?;
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![second.uuid, first.uuid]);
        assert!(orders.iter().all(|order| !order.lines.is_empty()));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_transitions_have_one_winner() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx).await?;
        let system = system();

        let (cancel, paid) = tokio::join!(
            ctx.orders.cancel(ctx.customer, order.uuid),
            ctx.orders.mark_paid(&system, order.uuid),
        );

        assert!(
            cancel.is_ok() != paid.is_ok(),
            "expected exactly one winner, got {cancel:?} and {paid:?}"
        );

        Ok(())
    }
}
