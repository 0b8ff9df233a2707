//! Port implementations over the REST API.

use super::client::RestClient;
use super::envelope::Listing;
use crate::domain::bank_account::{BankAccount, NewBankAccount};
use crate::domain::media::{MediaItem, MediaUpload};
use crate::domain::order::{OrderLine, OrderLineQuery};
use crate::domain::page::Page;
use crate::domain::ports::{
    BankAccountDirectory, MediaLibrary, OrderBook, ReportSource, SettlementGateway, ShopDirectory,
    TransactionLedger,
};
use crate::domain::settlement::SettlementRequest;
use crate::domain::shop::{SellerReport, Shop, ShopQuery, ShopSalesReport};
use crate::domain::transaction::LedgerEntry;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::instrument;

#[derive(Serialize)]
struct ShopParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
}

#[derive(Serialize)]
struct OrderLineParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    shop_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settled: Option<&'static str>,
}

#[derive(Serialize)]
struct PageParam {
    page: u32,
}

const NO_PARAMS: &[(&str, &str)] = &[];

#[async_trait]
impl ShopDirectory for RestClient {
    #[instrument(skip(self))]
    async fn list_shops(&self, query: &ShopQuery) -> Result<Page<Shop>> {
        let params = ShopParams {
            page: query.page,
            search: query.search.as_deref(),
            user_id: query.user_id,
        };
        let listing: Listing<Shop> = self.get("api/shops", &params).await?;
        Ok(listing.into())
    }

    #[instrument(skip(self))]
    async fn get_shop(&self, shop_id: u64) -> Result<Shop> {
        self.get(&format!("api/shops/{shop_id}"), NO_PARAMS).await
    }
}

#[async_trait]
impl OrderBook for RestClient {
    #[instrument(skip(self))]
    async fn shop_order_lines(
        &self,
        user_id: u64,
        query: &OrderLineQuery,
    ) -> Result<Page<OrderLine>> {
        let params = OrderLineParams {
            shop_id: query.shop_id,
            page: query.page,
            settled: query.settled.as_query(),
        };
        let listing: Listing<OrderLine> = self
            .get(&format!("api/orders/shop/{user_id}"), &params)
            .await?;
        Ok(listing.into())
    }
}

#[async_trait]
impl BankAccountDirectory for RestClient {
    #[instrument(skip(self))]
    async fn accounts_for_user(&self, user_id: u64) -> Result<Vec<BankAccount>> {
        let listing: Listing<BankAccount> = self
            .get(&format!("api/bank-accounts/user/{user_id}"), NO_PARAMS)
            .await?;
        Ok(Page::from(listing).data)
    }

    #[instrument(skip(self, account), fields(user_id = account.user_id))]
    async fn add_account(&self, account: &NewBankAccount) -> Result<BankAccount> {
        account.validate()?;
        self.post_json("api/bank-accounts/add", account).await
    }
}

#[async_trait]
impl SettlementGateway for RestClient {
    #[instrument(skip(self, request), fields(order_id = request.order_id))]
    async fn settle(&self, seller_id: &str, request: &SettlementRequest) -> Result<()> {
        self.post_form(
            &format!("api/transactions/settle/{seller_id}"),
            &request.form_fields(),
        )
        .await
    }

    #[instrument(skip(self, request), fields(order_id = request.order_id))]
    async fn reverse(&self, seller_id: &str, request: &SettlementRequest) -> Result<()> {
        self.post_form(
            &format!("api/transactions/reverse/{seller_id}"),
            &request.form_fields(),
        )
        .await
    }
}

#[async_trait]
impl TransactionLedger for RestClient {
    #[instrument(skip(self))]
    async fn transactions_for_user(&self, user_id: u64, page: u32) -> Result<Page<LedgerEntry>> {
        let listing: Listing<LedgerEntry> = self
            .get(
                &format!("api/transactions/user/{user_id}"),
                &PageParam { page },
            )
            .await?;
        Ok(listing.into())
    }
}

#[async_trait]
impl ReportSource for RestClient {
    #[instrument(skip(self))]
    async fn seller_report(&self, user_id: u64) -> Result<SellerReport> {
        self.get(&format!("api/reports/shop/{user_id}"), NO_PARAMS)
            .await
    }

    #[instrument(skip(self))]
    async fn shop_sales(&self, shop_id: u64) -> Result<ShopSalesReport> {
        self.get(&format!("api/reports/shop/sales/{shop_id}"), NO_PARAMS)
            .await
    }
}

#[async_trait]
impl MediaLibrary for RestClient {
    #[instrument(skip(self))]
    async fn media_page(&self, page: u32) -> Result<Page<MediaItem>> {
        let listing: Listing<MediaItem> = self.get("api/media", &PageParam { page }).await?;
        Ok(listing.into())
    }

    #[instrument(skip(self, upload), fields(file = %upload.file_name, bytes = upload.bytes.len()))]
    async fn upload(&self, upload: MediaUpload) -> Result<MediaItem> {
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("file", part);
        self.post_multipart("api/media/upload", form).await
    }
}
