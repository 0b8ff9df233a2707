use crate::domain::lenient::truthy_str;
use crate::domain::money::Money;
use crate::domain::order::OrderLine;
use crate::error::{Result, ShopError};
use serde::Deserialize;
use std::io::Read;

/// One row of a selection export. Every column but `id` may be blank.
#[derive(Debug, Deserialize)]
struct OrderLineRecord {
    id: u64,
    #[serde(default)]
    order_id: Option<u64>,
    #[serde(default)]
    order_item_id: Option<u64>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    qty: Option<u32>,
    #[serde(default)]
    line_total: Option<Money>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    is_settled: Option<String>,
}

impl From<OrderLineRecord> for OrderLine {
    fn from(record: OrderLineRecord) -> Self {
        Self {
            id: record.id,
            order_id: record.order_id,
            order_item_id: record.order_item_id,
            product_name: record.product_name.unwrap_or_default(),
            qty: record.qty.unwrap_or(1),
            line_total: record.line_total.unwrap_or_default(),
            status: record.status.unwrap_or_default(),
            created_at: record.created_at,
            settled: record.is_settled.as_deref().is_some_and(truthy_str),
            order: None,
        }
    }
}

/// Reads selected order lines from CSV.
///
/// Expects a header row; columns are matched by name, so exports with extra
/// or reordered columns are accepted.
pub struct OrderLineReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderLineReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields order lines, one `Result` per CSV row.
    pub fn order_lines(self) -> impl Iterator<Item = Result<OrderLine>> {
        self.reader
            .into_deserialize::<OrderLineRecord>()
            .map(|result| result.map(OrderLine::from).map_err(ShopError::from))
    }

    pub fn read_all(self) -> Result<Vec<OrderLine>> {
        self.order_lines().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "id, order_id, order_item_id, line_total, is_settled\n\
                    1, 1, 11, 50.00, 0\n\
                    2, , , 10, true\n";
        let lines = OrderLineReader::new(data.as_bytes()).read_all().unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].order_id, Some(1));
        assert_eq!(lines[0].settlement_item_id(), 11);
        assert_eq!(lines[0].line_total, Money::new(dec!(50)));
        assert!(!lines[0].is_settled());
        assert_eq!(lines[1].order_id, None);
        assert_eq!(lines[1].settlement_item_id(), 2);
        assert!(lines[1].is_settled());
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "id, order_id, line_total\nabc, 1, 1.0";
        let results: Vec<Result<OrderLine>> =
            OrderLineReader::new(data.as_bytes()).order_lines().collect();

        assert!(results[0].is_err());
    }
}
