//! Sequential order number allocation
//!
//! Numbers are claimed from a database sequence inside the creating
//! transaction, so uniqueness holds across processes; the unique constraint
//! on orders.order_no is the final backstop. Failed transactions may leave
//! gaps in the sequence, which is acceptable.

use sqlx::{Postgres, Transaction};

/// Minimum digit width of the numeric part. Sequences past 999 keep their
/// natural width ("O002", "O1000").
const ORDER_NO_WIDTH: usize = 3;

/// Claim the next order number within the given transaction.
pub async fn next_order_no(tx: &mut Transaction<'_, Postgres>) -> Result<String, sqlx::Error> {
    let sequence: i64 = sqlx::query_scalar("SELECT nextval('order_no_seq')")
        .fetch_one(&mut **tx)
        .await?;

    Ok(format_order_no(sequence))
}

/// Format a sequence value as an order number, e.g. 2 -> "O002".
pub fn format_order_no(sequence: i64) -> String {
    format!("O{:0width$}", sequence, width = ORDER_NO_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_order_no(1), "O001");
        assert_eq!(format_order_no(2), "O002");
        assert_eq!(format_order_no(42), "O042");
        assert_eq!(format_order_no(999), "O999");
    }

    #[test]
    fn test_format_grows_past_three_digits() {
        assert_eq!(format_order_no(1000), "O1000");
        assert_eq!(format_order_no(123_456), "O123456");
    }
}
