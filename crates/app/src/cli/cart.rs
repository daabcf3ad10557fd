use clap::{Args, Subcommand};
use kasa_app::{
    context::AppContext,
    domain::{
        carts::{
            data::{CartLinePatch, NewCartLine},
            records::{AddonSelection, CartLineUuid},
        },
        catalog::records::{AddonUuid, ProductUuid, VariantUuid},
    },
    identity::Capability,
};
use rusty_money::iso::Currency;
use uuid::Uuid;

use super::{principal::PrincipalArgs, print};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Add a product to the cart
    Add(AddArgs),
    /// List cart lines; `*` marks lines selected for checkout
    List(LineArgs),
    /// Include or exclude a line from the next checkout
    Select(SelectArgs),
    /// Remove a line from the cart
    Remove(RemoveArgs),
    /// Re-capture every line's price from the catalog
    Refresh(LineArgs),
}

#[derive(Debug, Args)]
struct LineArgs {
    #[command(flatten)]
    principal: PrincipalArgs,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    /// Product to add
    #[arg(long)]
    product: Uuid,

    /// Optional product variant
    #[arg(long)]
    variant: Option<Uuid>,

    /// Number of units
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Add-on as `<uuid>:<quantity>`; may be repeated
    #[arg(long = "addon", value_parser = parse_addon)]
    addons: Vec<AddonSelection>,

    /// Free-form line notes
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Debug, Args)]
struct SelectArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    /// Cart line to update
    #[arg(long)]
    line: Uuid,

    /// Whether the line takes part in checkout
    #[arg(long, action = clap::ArgAction::Set)]
    selected: bool,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    #[command(flatten)]
    principal: PrincipalArgs,

    /// Cart line to remove
    #[arg(long)]
    line: Uuid,
}

fn parse_addon(value: &str) -> Result<AddonSelection, String> {
    let (uuid, quantity) = value.split_once(':').unwrap_or((value, "1"));

    let addon_uuid = uuid
        .parse::<Uuid>()
        .map_err(|error| format!("invalid add-on uuid: {error}"))?;

    let quantity = quantity
        .parse::<u32>()
        .map_err(|error| format!("invalid add-on quantity: {error}"))?;

    Ok(AddonSelection {
        addon_uuid: AddonUuid::from_uuid(addon_uuid),
        quantity,
    })
}

pub(crate) async fn run(
    ctx: &AppContext,
    currency: &'static Currency,
    command: CartCommand,
) -> Result<(), String> {
    match command.command {
        CartSubcommand::Add(args) => {
            let customer = args.principal.customer(Capability::ManageCart)?;

            let line = ctx
                .carts
                .add_line(
                    customer,
                    NewCartLine {
                        uuid: CartLineUuid::new(),
                        product_uuid: ProductUuid::from_uuid(args.product),
                        variant_uuid: args.variant.map(VariantUuid::from_uuid),
                        quantity: args.quantity,
                        addons: args.addons,
                        notes: args.notes,
                    },
                )
                .await
                .map_err(|error| format!("failed to add cart line: {error}"))?;

            print::cart_line(&line, currency)
        }
        CartSubcommand::List(args) => {
            let customer = args.principal.customer(Capability::ManageCart)?;

            let lines = ctx
                .carts
                .list_lines(customer)
                .await
                .map_err(|error| format!("failed to list cart lines: {error}"))?;

            lines
                .iter()
                .try_for_each(|line| print::cart_line(line, currency))
        }
        CartSubcommand::Select(args) => {
            let customer = args.principal.customer(Capability::ManageCart)?;

            let line = ctx
                .carts
                .update_line(
                    customer,
                    CartLineUuid::from_uuid(args.line),
                    CartLinePatch {
                        selected: Some(args.selected),
                        ..CartLinePatch::default()
                    },
                )
                .await
                .map_err(|error| format!("failed to update cart line: {error}"))?;

            print::cart_line(&line, currency)
        }
        CartSubcommand::Remove(args) => {
            let customer = args.principal.customer(Capability::ManageCart)?;

            ctx.carts
                .remove_line(customer, CartLineUuid::from_uuid(args.line))
                .await
                .map_err(|error| format!("failed to remove cart line: {error}"))?;

            println!("removed cart line: {}", args.line);

            Ok(())
        }
        CartSubcommand::Refresh(args) => {
            let customer = args.principal.customer(Capability::ManageCart)?;

            let lines = ctx
                .carts
                .refresh_prices(customer)
                .await
                .map_err(|error| format!("failed to refresh prices: {error}"))?;

            lines
                .iter()
                .try_for_each(|line| print::cart_line(line, currency))
        }
    }
}
