//! Order numbers

use jiff::Timestamp;
use mockall::automock;
use rand::{Rng, distributions::Alphanumeric};

use crate::identity::CustomerUuid;

const SUFFIX_LEN: usize = 6;

/// Issues human-legible order numbers.
///
/// Numbers only need to be unlikely to collide; the `orders_order_number_key` constraint has
/// the final say and checkout asks for a fresh number when it trips.
#[automock]
pub trait OrderNumberGenerator: Send + Sync {
    fn next(&self, customer: CustomerUuid, issued_at: Timestamp) -> String;
}

/// `ORD-{unix seconds}-{first 8 hex digits of the customer id}-{6 random characters}`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampOrderNumbers;

impl OrderNumberGenerator for TimestampOrderNumbers {
    fn next(&self, customer: CustomerUuid, issued_at: Timestamp) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|byte| char::from(byte).to_ascii_uppercase())
            .collect();

        format!(
            "ORD-{}-{:08x}-{suffix}",
            issued_at.as_second(),
            customer.into_uuid().as_fields().0
        )
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn numbers_carry_time_and_customer_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let customer = CustomerUuid::from_uuid(Uuid::parse_str(
            "0191d7a2-35c4-7b3e-9c1f-2f4f4a7d9e10",
        )?);
        let issued_at = Timestamp::from_second(1_700_000_000)?;

        let number = TimestampOrderNumbers.next(customer, issued_at);
        let parts: Vec<&str> = number.split('-').collect();

        assert_eq!(parts.len(), 4, "unexpected shape: {number}");
        assert_eq!(parts.first(), Some(&"ORD"));
        assert_eq!(parts.get(1), Some(&"1700000000"));
        assert_eq!(parts.get(2), Some(&"0191d7a2"));
        assert_eq!(parts.get(3).map(|s| s.len()), Some(SUFFIX_LEN));

        Ok(())
    }

    #[test]
    fn consecutive_numbers_differ() {
        let customer = CustomerUuid::new();
        let issued_at = Timestamp::now();

        assert_ne!(
            TimestampOrderNumbers.next(customer, issued_at),
            TimestampOrderNumbers.next(customer, issued_at)
        );
    }
}
