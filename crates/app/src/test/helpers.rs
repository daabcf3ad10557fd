//! Test Helpers

use std::error::Error;

use kasa::orders::OrderDetails;
use sqlx::query;

use crate::{
    domain::{
        carts::{
            CartsService, CartsServiceError,
            data::NewCartLine,
            records::{CartLineRecord, CartLineUuid},
        },
        catalog::records::{AddonUuid, ProductUuid, VariantUuid},
        checkout::{CheckoutRequest, CheckoutService},
        orders::records::OrderRecord,
    },
    identity::{CustomerUuid, SystemIdentity},
    test::TestContext,
};

pub(crate) async fn create_product(
    ctx: &TestContext,
    name: &str,
    price: i64,
) -> Result<ProductUuid, sqlx::Error> {
    let uuid = ProductUuid::new();

    query("INSERT INTO products (uuid, name, price) VALUES ($1, $2, $3)")
        .bind(uuid.into_uuid())
        .bind(name)
        .bind(price)
        .execute(ctx.db.pool())
        .await?;

    Ok(uuid)
}

pub(crate) async fn create_variant(
    ctx: &TestContext,
    product: ProductUuid,
    name: &str,
    price: i64,
) -> Result<VariantUuid, sqlx::Error> {
    let uuid = VariantUuid::new();

    query("INSERT INTO product_variants (uuid, product_uuid, name, price) VALUES ($1, $2, $3, $4)")
        .bind(uuid.into_uuid())
        .bind(product.into_uuid())
        .bind(name)
        .bind(price)
        .execute(ctx.db.pool())
        .await?;

    Ok(uuid)
}

/// Create an add-on and offer it on `product`.
pub(crate) async fn create_addon(
    ctx: &TestContext,
    product: ProductUuid,
    name: &str,
    price: i64,
    max_quantity: i32,
) -> Result<AddonUuid, sqlx::Error> {
    let uuid = AddonUuid::new();

    query("INSERT INTO product_addons (uuid, name, price, max_quantity) VALUES ($1, $2, $3, $4)")
        .bind(uuid.into_uuid())
        .bind(name)
        .bind(price)
        .bind(max_quantity)
        .execute(ctx.db.pool())
        .await?;

    query("INSERT INTO product_addon_mappings (product_uuid, addon_uuid) VALUES ($1, $2)")
        .bind(product.into_uuid())
        .bind(uuid.into_uuid())
        .execute(ctx.db.pool())
        .await?;

    Ok(uuid)
}

pub(crate) async fn set_product_status(
    ctx: &TestContext,
    product: ProductUuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    query("UPDATE products SET status = $2, updated_at = now() WHERE uuid = $1")
        .bind(product.into_uuid())
        .bind(status)
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn delete_variant(
    ctx: &TestContext,
    variant: VariantUuid,
) -> Result<(), sqlx::Error> {
    query("UPDATE product_variants SET deleted_at = now(), updated_at = now() WHERE uuid = $1")
        .bind(variant.into_uuid())
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn set_addon_status(
    ctx: &TestContext,
    addon: AddonUuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    query("UPDATE product_addons SET status = $2, updated_at = now() WHERE uuid = $1")
        .bind(addon.into_uuid())
        .bind(status)
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn set_product_price(
    ctx: &TestContext,
    product: ProductUuid,
    price: i64,
) -> Result<(), sqlx::Error> {
    query("UPDATE products SET price = $2, updated_at = now() WHERE uuid = $1")
        .bind(product.into_uuid())
        .bind(price)
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn rename_product(
    ctx: &TestContext,
    product: ProductUuid,
    name: &str,
) -> Result<(), sqlx::Error> {
    query("UPDATE products SET name = $2, updated_at = now() WHERE uuid = $1")
        .bind(product.into_uuid())
        .bind(name)
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) fn new_line(product: ProductUuid, quantity: u32) -> NewCartLine {
    NewCartLine {
        uuid: CartLineUuid::new(),
        product_uuid: product,
        variant_uuid: None,
        quantity,
        addons: Vec::new(),
        notes: String::new(),
    }
}

pub(crate) async fn add_line(
    ctx: &TestContext,
    customer: CustomerUuid,
    product: ProductUuid,
    quantity: u32,
) -> Result<CartLineRecord, CartsServiceError> {
    ctx.carts
        .add_line(customer, new_line(product, quantity))
        .await
}

pub(crate) fn order_details() -> OrderDetails {
    OrderDetails {
        shipping_address: "1 Market Street, Springfield".to_string(),
        billing_address: "1 Market Street, Springfield".to_string(),
        payment_method: "card".to_string(),
        notes: String::new(),
    }
}

pub(crate) async fn count_orders(ctx: &TestContext) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(ctx.db.pool())
        .await
}

/// Put a single product in the cart and check it out.
pub(crate) async fn place_order(ctx: &TestContext) -> Result<OrderRecord, Box<dyn Error>> {
    let product = create_product(ctx, "Tee", 15_00).await?;

    add_line(ctx, ctx.customer, product, 1).await?;

    let order = ctx
        .checkout
        .checkout(
            ctx.customer,
            CheckoutRequest {
                details: order_details(),
            },
        )
        .await?;

    Ok(order)
}

pub(crate) fn system() -> SystemIdentity {
    SystemIdentity::new("payments")
}
