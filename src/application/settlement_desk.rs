use super::scope::FetchScope;
use super::settlement::{SettlementService, prepare};
use crate::domain::bank_account::{BankAccount, resolve_account};
use crate::domain::order::{OrderLine, OrderLineQuery, SettledFilter};
use crate::domain::ports::{BankAccountDirectoryBox, OrderBookBox};
use crate::domain::settlement::SettlementReceipt;
use crate::error::{Result, ShopError};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, instrument};

/// Where the settlement screen is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DeskState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded(String),
    Failed(String),
}

/// Moves the desk through a run and puts it back to `Idle` if the run is
/// dropped before reaching an outcome.
struct RunState<'a> {
    state: &'a watch::Sender<DeskState>,
    finished: bool,
}

impl<'a> RunState<'a> {
    fn start(state: &'a watch::Sender<DeskState>) -> Self {
        state.send_replace(DeskState::Validating);
        Self {
            state,
            finished: false,
        }
    }

    fn submitting(&self) {
        self.state.send_replace(DeskState::Submitting);
    }

    fn finish(mut self, outcome: DeskState) {
        self.finished = true;
        self.state.send_replace(outcome);
    }
}

impl Drop for RunState<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.state.send_if_modified(|state| match state {
            DeskState::Validating | DeskState::Submitting => {
                *state = DeskState::Idle;
                true
            }
            _ => false,
        });
    }
}

#[derive(Default)]
struct DeskView {
    rows: Vec<OrderLine>,
    accounts: Vec<BankAccount>,
    /// Row ids in the order they were selected.
    selected: Vec<u64>,
    account_id: Option<u64>,
}

/// The settlement screen: shop and account pickers, row selection, and the
/// submit button.
///
/// Only one settlement may be in flight; a second [`SettlementDesk::settle`]
/// while one is submitting fails with [`ShopError::Busy`].
pub struct SettlementDesk {
    seller_id: String,
    orders: OrderBookBox,
    accounts: BankAccountDirectoryBox,
    service: SettlementService,
    view: Mutex<DeskView>,
    state: watch::Sender<DeskState>,
    in_flight: tokio::sync::Mutex<()>,
}

impl SettlementDesk {
    pub fn new(
        seller_id: impl Into<String>,
        orders: OrderBookBox,
        accounts: BankAccountDirectoryBox,
        service: SettlementService,
    ) -> Self {
        let (state, _) = watch::channel(DeskState::Idle);
        Self {
            seller_id: seller_id.into(),
            orders,
            accounts,
            service,
            view: Mutex::new(DeskView::default()),
            state,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    fn view(&self) -> MutexGuard<'_, DeskView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seller_user_id(&self) -> Result<u64> {
        self.seller_id
            .trim()
            .parse()
            .map_err(|_| ShopError::validation("Seller id is required."))
    }

    pub fn state(&self) -> DeskState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<DeskState> {
        self.state.subscribe()
    }

    #[instrument(skip(self, scope), fields(seller = %self.seller_id))]
    pub async fn load_accounts(&self, scope: &FetchScope) -> Result<Vec<BankAccount>> {
        let user_id = self.seller_user_id()?;
        let accounts = scope.run(self.accounts.accounts_for_user(user_id)).await?;
        let mut view = self.view();
        view.accounts = accounts.clone();
        if let Some(id) = view.account_id {
            if !view.accounts.iter().any(|a| a.id == id) {
                view.account_id = None;
            }
        }
        Ok(accounts)
    }

    /// Loads the unsettled lines of one shop (or all shops). Replaces the rows
    /// on screen and clears the selection.
    #[instrument(skip(self, scope), fields(seller = %self.seller_id))]
    pub async fn load_rows(&self, shop_id: Option<u64>, scope: &FetchScope) -> Result<usize> {
        let user_id = self.seller_user_id()?;
        let query = OrderLineQuery {
            shop_id,
            page: None,
            settled: SettledFilter::Unsettled,
        };
        let page = scope.run(self.orders.shop_order_lines(user_id, &query)).await?;
        let rows: Vec<OrderLine> = page
            .data
            .into_iter()
            .filter(|line| !line.is_settled())
            .collect();
        let count = rows.len();
        let mut view = self.view();
        view.rows = rows;
        view.selected.clear();
        Ok(count)
    }

    /// Puts rows on screen directly, e.g. rows read from a file.
    pub fn set_rows(&self, rows: Vec<OrderLine>) {
        let mut view = self.view();
        view.rows = rows;
        view.selected.clear();
    }

    pub fn rows(&self) -> Vec<OrderLine> {
        self.view().rows.clone()
    }

    pub fn accounts(&self) -> Vec<BankAccount> {
        self.view().accounts.clone()
    }

    pub fn select_account(&self, account_id: u64) -> Result<()> {
        let mut view = self.view();
        resolve_account(&view.accounts, account_id)?;
        view.account_id = Some(account_id);
        Ok(())
    }

    /// Flips the checkbox of a row. Returns whether it is now selected.
    pub fn toggle_row(&self, row_id: u64) -> bool {
        let mut view = self.view();
        if !view.rows.iter().any(|r| r.id == row_id) {
            return false;
        }
        if let Some(pos) = view.selected.iter().position(|id| *id == row_id) {
            view.selected.remove(pos);
            false
        } else {
            view.selected.push(row_id);
            true
        }
    }

    pub fn select_all(&self) {
        let mut view = self.view();
        view.selected = view.rows.iter().map(|r| r.id).collect();
    }

    pub fn clear_selection(&self) {
        self.view().selected.clear();
    }

    pub fn selected_rows(&self) -> Vec<OrderLine> {
        let view = self.view();
        view.selected
            .iter()
            .filter_map(|id| view.rows.iter().find(|r| r.id == *id).cloned())
            .collect()
    }

    /// Validates and submits the current selection against the chosen account.
    ///
    /// Clears the selection on success. Settled rows are not reloaded; call
    /// [`SettlementDesk::load_rows`] to refresh.
    #[instrument(skip(self, scope), fields(seller = %self.seller_id))]
    pub async fn settle(&self, scope: &FetchScope) -> Result<SettlementReceipt> {
        let _in_flight = self.in_flight.try_lock().map_err(|_| ShopError::Busy)?;

        let run = RunState::start(&self.state);
        let prepared = {
            let view = self.view();
            let account = view
                .account_id
                .and_then(|id| view.accounts.iter().find(|a| a.id == id));
            let selected: Vec<OrderLine> = view
                .selected
                .iter()
                .filter_map(|id| view.rows.iter().find(|r| r.id == *id).cloned())
                .collect();
            prepare(&self.seller_id, account, &selected)
        };
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                run.finish(DeskState::Failed(e.to_string()));
                return Err(e);
            }
        };

        run.submitting();
        match self.service.submit(prepared, scope).await {
            Ok(receipt) => {
                info!(message = %receipt.message, "settlement succeeded");
                self.clear_selection();
                run.finish(DeskState::Succeeded(receipt.message.clone()));
                Ok(receipt)
            }
            Err(e) => {
                run.finish(DeskState::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}
