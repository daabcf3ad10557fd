use clap::{Args, Subcommand};
use kasa_app::{
    context::AppContext,
    domain::orders::records::{OrderRecord, OrderUuid},
    identity::Capability,
};
use rusty_money::iso::Currency;
use uuid::Uuid;

use super::{principal::PrincipalArgs, print};

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Show one order
    Show(OrderArgs),
    /// List orders, newest first
    List(ListArgs),
    /// Cancel a pending order
    Cancel(OrderArgs),
    /// Record payment for a pending order
    MarkPaid(OrderArgs),
    /// Mark a paid order fulfilled
    Complete(OrderArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    principal: PrincipalArgs,
}

#[derive(Debug, Args)]
struct OrderArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    /// Order to act on
    #[arg(long)]
    order: Uuid,
}

pub(crate) async fn run(
    ctx: &AppContext,
    currency: &'static Currency,
    command: OrderCommand,
) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Show(args) => {
            let customer = args.principal.customer(Capability::ViewOrders)?;

            let order = ctx
                .orders
                .get_order(customer, OrderUuid::from_uuid(args.order))
                .await
                .map_err(|error| format!("failed to fetch order: {error}"))?;

            print::order(&order, currency)
        }
        OrderSubcommand::List(args) => {
            let customer = args.principal.customer(Capability::ViewOrders)?;

            let orders = ctx
                .orders
                .list_orders(customer)
                .await
                .map_err(|error| format!("failed to list orders: {error}"))?;

            for order in &orders {
                summary(order);
            }

            Ok(())
        }
        OrderSubcommand::Cancel(args) => {
            let customer = args.principal.customer(Capability::CancelOrder)?;

            let order = ctx
                .orders
                .cancel(customer, OrderUuid::from_uuid(args.order))
                .await
                .map_err(|error| format!("failed to cancel order: {error}"))?;

            summary(&order);

            Ok(())
        }
        OrderSubcommand::MarkPaid(args) => {
            let system = args.principal.system(Capability::MarkOrderPaid)?;

            let order = ctx
                .orders
                .mark_paid(&system, OrderUuid::from_uuid(args.order))
                .await
                .map_err(|error| format!("failed to mark order paid: {error}"))?;

            summary(&order);

            Ok(())
        }
        OrderSubcommand::Complete(args) => {
            let system = args.principal.system(Capability::CompleteOrder)?;

            let order = ctx
                .orders
                .complete(&system, OrderUuid::from_uuid(args.order))
                .await
                .map_err(|error| format!("failed to complete order: {error}"))?;

            summary(&order);

            Ok(())
        }
    }
}

fn summary(order: &OrderRecord) {
    println!(
        "{} {} {} {}",
        order.uuid, order.order_number, order.status, order.created_at
    );
}
