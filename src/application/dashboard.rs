use super::scope::FetchScope;
use crate::domain::page::Page;
use crate::domain::ports::{ReportSourceBox, ShopDirectoryBox, TransactionLedgerBox};
use crate::domain::shop::{SellerReport, Shop, ShopQuery, ShopSalesReport};
use crate::domain::transaction::LedgerEntry;
use crate::error::{Result, ShopError};
use tracing::{instrument, warn};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShopSummary {
    pub shop: Shop,
    pub sales: ShopSalesReport,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SellerDashboard {
    pub report: SellerReport,
    pub shops: Vec<ShopSummary>,
}

/// Turns a failed panel load into its empty value.
///
/// Cancellation and an expired session still propagate: the first means the
/// result must not be applied, the second needs the user to log in again.
fn degrade<T: Default>(panel: &str, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e @ (ShopError::Cancelled | ShopError::Unauthorized)) => Err(e),
        Err(e) => {
            warn!(panel, error = %e, "panel failed to load, showing empty");
            Ok(T::default())
        }
    }
}

/// The seller's landing screen: metrics, shops with their sales, and the
/// transaction report.
pub struct Dashboard {
    shops: ShopDirectoryBox,
    reports: ReportSourceBox,
    ledger: TransactionLedgerBox,
}

impl Dashboard {
    pub fn new(
        shops: ShopDirectoryBox,
        reports: ReportSourceBox,
        ledger: TransactionLedgerBox,
    ) -> Self {
        Self {
            shops,
            reports,
            ledger,
        }
    }

    #[instrument(skip(self, scope))]
    pub async fn load(&self, user_id: u64, scope: &FetchScope) -> Result<SellerDashboard> {
        let report = degrade(
            "seller report",
            scope.run(self.reports.seller_report(user_id)).await,
        )?;

        let query = ShopQuery {
            user_id: Some(user_id),
            ..Default::default()
        };
        let shops: Page<Shop> = degrade("shops", scope.run(self.shops.list_shops(&query)).await)?;

        let mut summaries = Vec::with_capacity(shops.data.len());
        for shop in shops.data {
            let sales = degrade("shop sales", scope.run(self.reports.shop_sales(shop.id)).await)?;
            summaries.push(ShopSummary { shop, sales });
        }

        Ok(SellerDashboard {
            report,
            shops: summaries,
        })
    }

    pub async fn shops(&self, query: &ShopQuery, scope: &FetchScope) -> Result<Page<Shop>> {
        degrade("shops", scope.run(self.shops.list_shops(query)).await)
    }

    /// Shop detail has no empty form, so errors are returned as is.
    pub async fn shop(&self, shop_id: u64, scope: &FetchScope) -> Result<Shop> {
        scope.run(self.shops.get_shop(shop_id)).await
    }

    pub async fn transactions(
        &self,
        user_id: u64,
        page: u32,
        scope: &FetchScope,
    ) -> Result<Page<LedgerEntry>> {
        degrade(
            "transactions",
            scope
                .run(self.ledger.transactions_for_user(user_id, page.max(1)))
                .await,
        )
    }
}
