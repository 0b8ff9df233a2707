use super::lenient;
use super::money::Money;
use serde::{Deserialize, Serialize};

/// A customer order, as embedded in its lines by some endpoints. Never mutated
/// here. The id may be missing or `null` in older rows, and some rows carry it
/// as `order_id` instead of (or next to) `id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl Order {
    /// `id`, falling back to `order_id`.
    pub fn resolved_id(&self) -> Option<u64> {
        self.id.or(self.order_id)
    }
}

/// One product-level entry of a customer order; the unit selected for settlement.
///
/// Read-only from this crate's perspective. The parent order id is found either
/// on the nested `order` object or on the flat `order_id` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub order_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub order_item_id: Option<u64>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub line_total: Money,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, rename = "is_settled", deserialize_with = "lenient::flag")]
    pub settled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl OrderLine {
    /// The nested order's id, falling back to the flat `order_id` column.
    pub fn resolved_order_id(&self) -> Option<u64> {
        self.order
            .as_ref()
            .and_then(Order::resolved_id)
            .or(self.order_id)
    }

    /// The id sent in `order_item_ids[]`: the order item id, or the row id if absent.
    pub fn settlement_item_id(&self) -> u64 {
        self.order_item_id.unwrap_or(self.id)
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

/// Which lines to ask the order book for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettledFilter {
    #[default]
    All,
    Settled,
    Unsettled,
}

impl SettledFilter {
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Settled => Some("1"),
            Self::Unsettled => Some("0"),
        }
    }

    pub fn matches(&self, line: &OrderLine) -> bool {
        match self {
            Self::All => true,
            Self::Settled => line.settled,
            Self::Unsettled => !line.settled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderLineQuery {
    pub shop_id: Option<u64>,
    pub page: Option<u32>,
    pub settled: SettledFilter,
}
