use super::lenient;
use super::money::Money;
use serde::{Deserialize, Serialize};

/// A ledger entry shown in the seller's transaction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default)]
    pub amount: Money,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub trx_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
