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
use crate::error::{Result, ShopError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

const DEFAULT_PAGE_SIZE: usize = 20;

/// A request seen by the settlement gateway, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCall {
    Settle(u64),
    Reverse(u64),
}

#[derive(Default)]
struct BackendState {
    shops: Vec<Shop>,
    /// (seller user id, shop id, line)
    order_lines: Vec<(u64, Option<u64>, OrderLine)>,
    accounts: Vec<BankAccount>,
    ledger: Vec<(u64, LedgerEntry)>,
    reports: HashMap<u64, SellerReport>,
    shop_sales: HashMap<u64, ShopSalesReport>,
    media: Vec<MediaItem>,
    media_page_size: usize,
    calls: Vec<GatewayCall>,
    settled: Vec<SettlementRequest>,
    fail_settle: HashMap<u64, String>,
    fail_reverse: HashMap<u64, String>,
    fail_reads: Option<String>,
    latency: Option<Duration>,
}

/// An in-process stand-in for the REST backend.
///
/// Implements every port over shared state, records the order of settlement
/// calls, and can be told to fail specific orders. Clones share the state, so
/// one backend can be boxed into several ports.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<BackendState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_page_size(self, size: usize) -> Self {
        self.write().media_page_size = size;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_shop(&self, shop: Shop) {
        self.write().shops.push(shop);
    }

    pub fn add_order_line(&self, seller_id: u64, shop_id: Option<u64>, line: OrderLine) {
        self.write().order_lines.push((seller_id, shop_id, line));
    }

    pub fn add_bank_account(&self, account: BankAccount) {
        self.write().accounts.push(account);
    }

    pub fn add_ledger_entry(&self, user_id: u64, entry: LedgerEntry) {
        self.write().ledger.push((user_id, entry));
    }

    pub fn set_seller_report(&self, user_id: u64, report: SellerReport) {
        self.write().reports.insert(user_id, report);
    }

    pub fn set_shop_sales(&self, shop_id: u64, sales: ShopSalesReport) {
        self.write().shop_sales.insert(shop_id, sales);
    }

    pub fn add_media(&self, item: MediaItem) {
        self.write().media.push(item);
    }

    pub fn fail_settlement_for(&self, order_id: u64, message: &str) {
        self.write().fail_settle.insert(order_id, message.to_string());
    }

    pub fn fail_reversal_for(&self, order_id: u64, message: &str) {
        self.write().fail_reverse.insert(order_id, message.to_string());
    }

    /// Makes every read endpoint answer with an error envelope.
    pub fn fail_reads(&self, message: &str) {
        self.write().fail_reads = Some(message.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        self.write().latency = Some(latency);
    }

    pub fn gateway_calls(&self) -> Vec<GatewayCall> {
        self.read().calls.clone()
    }

    /// Orders currently settled, i.e. accepted and not reversed.
    pub fn settled_order_ids(&self) -> Vec<u64> {
        self.read().settled.iter().map(|r| r.order_id).collect()
    }

    pub fn settled_requests(&self) -> Vec<SettlementRequest> {
        self.read().settled.clone()
    }

    fn check_reads(&self) -> Result<()> {
        match &self.read().fail_reads {
            Some(message) => Err(ShopError::Api(message.clone())),
            None => Ok(()),
        }
    }

    async fn delay(&self) {
        let latency = self.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let last_page = items.len().div_ceil(per_page).max(1) as u32;
    let start = (page as usize - 1) * per_page;
    let data = items.iter().skip(start).take(per_page).cloned().collect();
    Page {
        data,
        current_page: page,
        last_page,
        per_page: per_page as u32,
        total: items.len() as u64,
    }
}

#[async_trait]
impl ShopDirectory for InMemoryBackend {
    async fn list_shops(&self, query: &ShopQuery) -> Result<Page<Shop>> {
        self.check_reads()?;
        let state = self.read();
        let shops: Vec<Shop> = state
            .shops
            .iter()
            .filter(|s| query.user_id.is_none() || s.user_id == query.user_id)
            .filter(|s| match &query.search {
                Some(term) => s.name.to_lowercase().contains(&term.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(&shops, query.page.unwrap_or(1), DEFAULT_PAGE_SIZE))
    }

    async fn get_shop(&self, shop_id: u64) -> Result<Shop> {
        self.check_reads()?;
        self.read()
            .shops
            .iter()
            .find(|s| s.id == shop_id)
            .cloned()
            .ok_or_else(|| ShopError::Api("Shop not found".to_string()))
    }
}

#[async_trait]
impl OrderBook for InMemoryBackend {
    async fn shop_order_lines(
        &self,
        user_id: u64,
        query: &OrderLineQuery,
    ) -> Result<Page<OrderLine>> {
        self.check_reads()?;
        let state = self.read();
        let lines: Vec<OrderLine> = state
            .order_lines
            .iter()
            .filter(|(seller, shop, _)| {
                *seller == user_id && (query.shop_id.is_none() || *shop == query.shop_id)
            })
            .map(|(_, _, line)| line)
            .filter(|line| query.settled.matches(line))
            .cloned()
            .collect();
        Ok(paginate(&lines, query.page.unwrap_or(1), DEFAULT_PAGE_SIZE))
    }
}

#[async_trait]
impl BankAccountDirectory for InMemoryBackend {
    async fn accounts_for_user(&self, user_id: u64) -> Result<Vec<BankAccount>> {
        self.check_reads()?;
        Ok(self
            .read()
            .accounts
            .iter()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn add_account(&self, account: &NewBankAccount) -> Result<BankAccount> {
        let mut state = self.write();
        let id = state.accounts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let created = BankAccount {
            id,
            user_id: Some(account.user_id),
            bank_name: account.bank_name.clone(),
            account_name: Some(account.account_name.clone()),
            account_no: account.account_no.clone(),
            kind: account.kind,
            route: account.route.clone(),
            address: account.address.clone(),
        };
        state.accounts.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl SettlementGateway for InMemoryBackend {
    async fn settle(&self, _seller_id: &str, request: &SettlementRequest) -> Result<()> {
        self.delay().await;
        let mut state = self.write();
        state.calls.push(GatewayCall::Settle(request.order_id));
        if let Some(message) = state.fail_settle.get(&request.order_id) {
            return Err(ShopError::Api(message.clone()));
        }
        state.settled.push(request.clone());
        Ok(())
    }

    async fn reverse(&self, _seller_id: &str, request: &SettlementRequest) -> Result<()> {
        self.delay().await;
        let mut state = self.write();
        state.calls.push(GatewayCall::Reverse(request.order_id));
        if let Some(message) = state.fail_reverse.get(&request.order_id) {
            return Err(ShopError::Api(message.clone()));
        }
        state.settled.retain(|r| r.order_id != request.order_id);
        Ok(())
    }
}

#[async_trait]
impl TransactionLedger for InMemoryBackend {
    async fn transactions_for_user(&self, user_id: u64, page: u32) -> Result<Page<LedgerEntry>> {
        self.check_reads()?;
        let entries: Vec<LedgerEntry> = self
            .read()
            .ledger
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, entry)| entry.clone())
            .collect();
        Ok(paginate(&entries, page, DEFAULT_PAGE_SIZE))
    }
}

#[async_trait]
impl ReportSource for InMemoryBackend {
    async fn seller_report(&self, user_id: u64) -> Result<SellerReport> {
        self.check_reads()?;
        Ok(self.read().reports.get(&user_id).cloned().unwrap_or_default())
    }

    async fn shop_sales(&self, shop_id: u64) -> Result<ShopSalesReport> {
        self.check_reads()?;
        Ok(self
            .read()
            .shop_sales
            .get(&shop_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl MediaLibrary for InMemoryBackend {
    /// Newest uploads first.
    async fn media_page(&self, page: u32) -> Result<Page<MediaItem>> {
        self.check_reads()?;
        let state = self.read();
        let newest_first: Vec<MediaItem> = state.media.iter().rev().cloned().collect();
        let size = if state.media_page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            state.media_page_size
        };
        Ok(paginate(&newest_first, page, size))
    }

    async fn upload(&self, upload: MediaUpload) -> Result<MediaItem> {
        if upload.bytes.is_empty() {
            return Err(ShopError::Api("The file field is required.".to_string()));
        }
        let mut state = self.write();
        let id = state.media.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let item = MediaItem {
            id,
            url: format!("memory://media/{}", upload.file_name),
            file_name: Some(upload.file_name),
            mime_type: None,
            created_at: None,
        };
        state.media.push(item.clone());
        Ok(item)
    }
}
