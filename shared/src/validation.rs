//! Validation helpers for the stationery stock ledger
//!
//! These are wired into the request DTOs via `validator` custom rules; the
//! services re-check the same domain invariants defensively before writing.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Names must contain at least one non-whitespace character
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

/// Prices must be strictly positive
pub fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.message = Some("must be greater than zero".into());
        return Err(error);
    }
    Ok(())
}

/// Quantities must be strictly positive
pub fn is_positive_quantity(qty: i32) -> bool {
    qty > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_not_blank_accepts_names() {
        assert!(validate_not_blank("Ballpoint Pen").is_ok());
        assert!(validate_not_blank("  A4 Paper ").is_ok());
    }

    #[test]
    fn test_not_blank_rejects_empty_and_whitespace() {
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("\t\n").is_err());
    }

    #[test]
    fn test_positive_price() {
        assert!(validate_positive_price(&Decimal::new(1250, 2)).is_ok());
        assert!(validate_positive_price(&Decimal::ZERO).is_err());
        assert!(validate_positive_price(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_positive_quantity() {
        assert!(is_positive_quantity(1));
        assert!(!is_positive_quantity(0));
        assert!(!is_positive_quantity(-5));
    }

    proptest! {
        #[test]
        fn prop_positive_prices_accepted(units in 1i64..=1_000_000) {
            let price = Decimal::new(units, 2);
            prop_assert!(validate_positive_price(&price).is_ok());
        }

        #[test]
        fn prop_non_positive_prices_rejected(units in 0i64..=1_000_000) {
            let price = Decimal::new(-units, 2);
            prop_assert!(validate_positive_price(&price).is_err());
        }
    }
}
