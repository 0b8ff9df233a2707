use super::bank_account::{BankAccount, NewBankAccount};
use super::media::{MediaItem, MediaUpload};
use super::order::{OrderLine, OrderLineQuery};
use super::page::Page;
use super::settlement::SettlementRequest;
use super::shop::{SellerReport, Shop, ShopQuery, ShopSalesReport};
use super::transaction::LedgerEntry;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ShopDirectory: Send + Sync {
    async fn list_shops(&self, query: &ShopQuery) -> Result<Page<Shop>>;
    async fn get_shop(&self, shop_id: u64) -> Result<Shop>;
}

#[async_trait]
pub trait OrderBook: Send + Sync {
    /// Order lines of a seller's shops, the rows offered for settlement.
    async fn shop_order_lines(&self, user_id: u64, query: &OrderLineQuery)
    -> Result<Page<OrderLine>>;
}

#[async_trait]
pub trait BankAccountDirectory: Send + Sync {
    async fn accounts_for_user(&self, user_id: u64) -> Result<Vec<BankAccount>>;
    async fn add_account(&self, account: &NewBankAccount) -> Result<BankAccount>;
}

#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn settle(&self, seller_id: &str, request: &SettlementRequest) -> Result<()>;
    /// Undoes an accepted settlement.
    async fn reverse(&self, seller_id: &str, request: &SettlementRequest) -> Result<()>;
}

#[async_trait]
pub trait TransactionLedger: Send + Sync {
    async fn transactions_for_user(&self, user_id: u64, page: u32) -> Result<Page<LedgerEntry>>;
}

#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn seller_report(&self, user_id: u64) -> Result<SellerReport>;
    async fn shop_sales(&self, shop_id: u64) -> Result<ShopSalesReport>;
}

#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn media_page(&self, page: u32) -> Result<Page<MediaItem>>;
    async fn upload(&self, upload: MediaUpload) -> Result<MediaItem>;
}

pub type ShopDirectoryBox = Box<dyn ShopDirectory>;
pub type OrderBookBox = Box<dyn OrderBook>;
pub type BankAccountDirectoryBox = Box<dyn BankAccountDirectory>;
pub type SettlementGatewayBox = Box<dyn SettlementGateway>;
pub type TransactionLedgerBox = Box<dyn TransactionLedger>;
pub type ReportSourceBox = Box<dyn ReportSource>;
pub type MediaLibraryBox = Box<dyn MediaLibrary>;
