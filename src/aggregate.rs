//! Derived totals for a recognized receipt. All functions are total:
//! missing fields contribute 0 and nothing here can fail.

use crate::types::ReceiptData;

/// Sum of reported line totals.
pub fn subtotal(data: &ReceiptData) -> f64 {
    data.product_item
        .iter()
        .map(|item| item.total_price.unwrap_or(0.0))
        .sum()
}

/// Sum of reported discount amounts.
pub fn total_discount(data: &ReceiptData) -> f64 {
    data.product_item_discount
        .iter()
        .map(|d| d.discount.unwrap_or(0.0))
        .sum()
}

/// Subtotal minus discounts. Not clamped: a negative result is a valid,
/// displayable anomaly.
pub fn final_total(data: &ReceiptData) -> f64 {
    subtotal(data) - total_discount(data)
}

/// Sum of reported quantities. Float because weighed goods may carry
/// fractional quantities.
pub fn item_count(data: &ReceiptData) -> f64 {
    data.product_item
        .iter()
        .map(|item| item.quantity.unwrap_or(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReceiptDiscount, ReceiptItem};

    fn item(total_price: Option<f64>, quantity: Option<f64>) -> ReceiptItem {
        ReceiptItem {
            total_price,
            quantity,
            ..ReceiptItem::default()
        }
    }

    #[test]
    fn totals_match_reported_values() {
        let data = ReceiptData {
            product_item: vec![item(Some(10_000.0), Some(2.0)), item(Some(5_000.0), Some(1.0))],
            product_item_discount: vec![ReceiptDiscount {
                discount: Some(2_000.0),
            }],
        };
        assert_eq!(subtotal(&data), 15_000.0);
        assert_eq!(total_discount(&data), 2_000.0);
        assert_eq!(final_total(&data), 13_000.0);
        assert_eq!(item_count(&data), 3.0);
    }

    #[test]
    fn missing_fields_contribute_zero() {
        let data = ReceiptData {
            product_item: vec![item(None, None), item(Some(750.0), None)],
            product_item_discount: vec![ReceiptDiscount { discount: None }],
        };
        assert_eq!(subtotal(&data), 750.0);
        assert_eq!(total_discount(&data), 0.0);
        assert_eq!(final_total(&data), 750.0);
        assert_eq!(item_count(&data), 0.0);
    }

    #[test]
    fn empty_receipt_aggregates_to_zero() {
        let data = ReceiptData::default();
        assert_eq!(subtotal(&data), 0.0);
        assert_eq!(total_discount(&data), 0.0);
        assert_eq!(final_total(&data), 0.0);
        assert_eq!(item_count(&data), 0.0);
    }

    #[test]
    fn final_total_may_go_negative() {
        let data = ReceiptData {
            product_item: vec![item(Some(1_000.0), Some(1.0))],
            product_item_discount: vec![ReceiptDiscount {
                discount: Some(2_500.0),
            }],
        };
        assert_eq!(final_total(&data), -1_500.0);
    }

    #[test]
    fn fractional_quantities_are_preserved() {
        let data = ReceiptData {
            product_item: vec![item(Some(4_200.0), Some(0.5)), item(Some(100.0), Some(1.25))],
            product_item_discount: vec![],
        };
        assert_eq!(item_count(&data), 1.75);
    }
}
