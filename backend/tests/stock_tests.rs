//! Stock calculation tests
//!
//! Tests for the derived remaining-stock value:
//! - remaining stock equals sum of top-ups minus sum of withdrawals
//! - guarded operations never drive stock negative

use proptest::prelude::*;

/// Movement kinds as the ledger sees them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    TopUp,
    Withdrawal,
}

/// Signed sum of a movement ledger
pub fn remaining_stock(movements: &[(Kind, i64)]) -> i64 {
    movements
        .iter()
        .map(|(kind, qty)| match kind {
            Kind::TopUp => *qty,
            Kind::Withdrawal => -*qty,
        })
        .sum()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_empty_ledger_is_zero() {
        assert_eq!(remaining_stock(&[]), 0);
    }

    #[test]
    fn test_top_ups_accumulate() {
        let movements = [(Kind::TopUp, 50), (Kind::TopUp, 30), (Kind::TopUp, 20)];
        assert_eq!(remaining_stock(&movements), 100);
    }

    #[test]
    fn test_withdrawals_subtract() {
        let movements = [
            (Kind::TopUp, 100),
            (Kind::Withdrawal, 30),
            (Kind::Withdrawal, 20),
        ];
        assert_eq!(remaining_stock(&movements), 50);
    }

    /// Top-up of 100 then an order of 30 leaves 70
    #[test]
    fn test_top_up_then_order_scenario() {
        let mut movements = vec![(Kind::TopUp, 100)];
        assert_eq!(remaining_stock(&movements), 100);

        movements.push((Kind::Withdrawal, 30));
        assert_eq!(remaining_stock(&movements), 70);
    }

    #[test]
    fn test_full_withdrawal_reaches_zero() {
        let movements = [(Kind::TopUp, 100), (Kind::Withdrawal, 100)];
        assert_eq!(remaining_stock(&movements), 0);
    }

    #[test]
    fn test_insufficient_stock_detection() {
        let movements = [(Kind::TopUp, 70)];
        let available = remaining_stock(&movements);
        let requested = 100;

        assert!(available < requested);
    }

    #[test]
    fn test_sum_is_order_independent() {
        let forward = [
            (Kind::TopUp, 40),
            (Kind::Withdrawal, 10),
            (Kind::TopUp, 5),
            (Kind::Withdrawal, 15),
        ];
        let mut reversed = forward;
        reversed.reverse();

        assert_eq!(remaining_stock(&forward), remaining_stock(&reversed));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities
    fn quantity_strategy() -> impl Strategy<Value = i64> {
        1i64..=10_000
    }

    /// Strategy for generating movement kinds
    fn kind_strategy() -> impl Strategy<Value = Kind> {
        prop_oneof![Just(Kind::TopUp), Just(Kind::Withdrawal)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Remaining stock = Sum(top-ups) - Sum(withdrawals)
        #[test]
        fn prop_remaining_stock_accuracy(
            movements in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..20)
        ) {
            let total_in: i64 = movements
                .iter()
                .filter(|(kind, _)| *kind == Kind::TopUp)
                .map(|(_, qty)| qty)
                .sum();
            let total_out: i64 = movements
                .iter()
                .filter(|(kind, _)| *kind == Kind::Withdrawal)
                .map(|(_, qty)| qty)
                .sum();

            prop_assert_eq!(remaining_stock(&movements), total_in - total_out);
        }

        /// Appending a top-up raises the balance by exactly its quantity
        #[test]
        fn prop_top_up_adds_quantity(
            movements in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..20),
            qty in quantity_strategy()
        ) {
            let before = remaining_stock(&movements);

            let mut extended = movements;
            extended.push((Kind::TopUp, qty));

            prop_assert_eq!(remaining_stock(&extended), before + qty);
        }

        /// Appending a withdrawal lowers the balance by exactly its quantity
        #[test]
        fn prop_withdrawal_subtracts_quantity(
            movements in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..20),
            qty in quantity_strategy()
        ) {
            let before = remaining_stock(&movements);

            let mut extended = movements;
            extended.push((Kind::Withdrawal, qty));

            prop_assert_eq!(remaining_stock(&extended), before - qty);
        }

        /// A withdrawal guarded by the stock check never drives stock negative
        #[test]
        fn prop_guarded_withdrawals_stay_non_negative(
            top_ups in prop::collection::vec(quantity_strategy(), 1..10),
            requests in prop::collection::vec(quantity_strategy(), 0..20)
        ) {
            let mut movements: Vec<(Kind, i64)> =
                top_ups.into_iter().map(|qty| (Kind::TopUp, qty)).collect();

            for requested in requests {
                if remaining_stock(&movements) >= requested {
                    movements.push((Kind::Withdrawal, requested));
                }
            }

            prop_assert!(remaining_stock(&movements) >= 0);
        }
    }
}

// ============================================================================
// Simulation Helpers
// ============================================================================

#[cfg(test)]
mod simulation {
    use super::*;

    /// Apply one movement to a balance with the service's guard rules
    pub fn apply_movement(
        current_balance: i64,
        kind: Kind,
        quantity: i64,
    ) -> Result<i64, &'static str> {
        if quantity <= 0 {
            return Err("Quantity must be positive");
        }

        match kind {
            Kind::TopUp => Ok(current_balance + quantity),
            Kind::Withdrawal => {
                if current_balance >= quantity {
                    Ok(current_balance - quantity)
                } else {
                    Err("Insufficient stock")
                }
            }
        }
    }

    #[test]
    fn test_apply_top_up() {
        assert_eq!(apply_movement(100, Kind::TopUp, 50), Ok(150));
    }

    #[test]
    fn test_apply_withdrawal() {
        assert_eq!(apply_movement(100, Kind::Withdrawal, 30), Ok(70));
    }

    #[test]
    fn test_apply_withdrawal_insufficient() {
        assert!(apply_movement(50, Kind::Withdrawal, 60).is_err());
    }

    #[test]
    fn test_apply_rejects_non_positive_quantity() {
        assert!(apply_movement(100, Kind::TopUp, 0).is_err());
        assert!(apply_movement(100, Kind::Withdrawal, -10).is_err());
    }
}
