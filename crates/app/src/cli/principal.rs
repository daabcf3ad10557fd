use clap::Args;
use kasa_app::identity::{Capability, CustomerUuid, Principal, SystemIdentity};
use uuid::Uuid;

/// Who the command acts for.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub(crate) struct PrincipalArgs {
    /// Act as this customer
    #[arg(long)]
    customer: Option<Uuid>,

    /// Act as this internal system, e.g. "payments"
    #[arg(long)]
    system: Option<String>,
}

impl PrincipalArgs {
    fn principal(self) -> Result<Principal, String> {
        match (self.customer, self.system) {
            (Some(customer), None) => Ok(Principal::Customer(CustomerUuid::from_uuid(customer))),
            (None, Some(name)) if !name.trim().is_empty() => {
                Ok(Principal::System(SystemIdentity::new(name)))
            }
            _ => Err("pass either --customer or a non-empty --system".to_string()),
        }
    }

    /// Resolve the caller as a customer holding `capability`.
    pub(crate) fn customer(self, capability: Capability) -> Result<CustomerUuid, String> {
        let principal = self.principal()?;

        principal
            .require(capability)
            .map_err(|error| error.to_string())?;

        principal
            .customer()
            .ok_or_else(|| format!("{principal} is not a customer"))
    }

    /// Resolve the caller as a system identity holding `capability`.
    pub(crate) fn system(self, capability: Capability) -> Result<SystemIdentity, String> {
        let principal = self.principal()?;

        principal
            .require(capability)
            .map_err(|error| error.to_string())?;

        principal
            .system()
            .cloned()
            .ok_or_else(|| format!("{principal} is not a system identity"))
    }
}
