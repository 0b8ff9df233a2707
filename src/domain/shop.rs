use super::lenient;
use super::money::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shop {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: bool,
}

/// Filters for `GET /api/shops`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShopQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub user_id: Option<u64>,
}

/// Seller-wide metrics from `GET /api/reports/shop/:userId`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SellerReport {
    #[serde(default)]
    pub total_shops: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_sales: Money,
    #[serde(default)]
    pub settled_amount: Money,
    #[serde(default)]
    pub unsettled_amount: Money,
}

/// Sales of a single shop from `GET /api/reports/shop/sales/:shopId`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShopSalesReport {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub shop_id: Option<u64>,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_sales: Money,
}
