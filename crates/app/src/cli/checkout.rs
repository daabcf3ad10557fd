use clap::Args;
use kasa::orders::OrderDetails;
use kasa_app::{
    context::AppContext,
    domain::checkout::{CheckoutError, CheckoutRequest},
    identity::Capability,
};
use rusty_money::iso::Currency;

use super::{principal::PrincipalArgs, print};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    /// Delivery address
    #[arg(long)]
    shipping_address: String,

    /// Billing address; defaults to the shipping address
    #[arg(long)]
    billing_address: Option<String>,

    /// Payment method label
    #[arg(long, default_value = "card")]
    payment_method: String,

    /// Free-form order notes
    #[arg(long, default_value = "")]
    notes: String,
}

pub(crate) async fn run(
    ctx: &AppContext,
    currency: &'static Currency,
    args: CheckoutArgs,
) -> Result<(), String> {
    let customer = args.principal.customer(Capability::Checkout)?;

    let details = OrderDetails {
        billing_address: args
            .billing_address
            .unwrap_or_else(|| args.shipping_address.clone()),
        shipping_address: args.shipping_address,
        payment_method: args.payment_method,
        notes: args.notes,
    };

    let order = match ctx
        .checkout
        .checkout(customer, CheckoutRequest { details })
        .await
    {
        Ok(order) => order,
        Err(CheckoutError::PriceChanged { line, .. }) => {
            return Err(format!(
                "prices changed since line {line} was added; run `kasa-app cart refresh` and retry"
            ));
        }
        Err(error) => return Err(format!("checkout failed: {error}")),
    };

    print::order(&order, currency)
}
