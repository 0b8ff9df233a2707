//! The process-wide session: auth token, current user and cart.
//!
//! All reads and writes go through [`Session`]; every change is published on a
//! broadcast channel so open screens can react (for example, a 401 anywhere
//! publishes [`SessionEvent::LoginRequired`]). Writes are applied one at a time
//! and are flushed to the session file, when one is attached, before the lock is
//! released. A write that cannot be saved is rolled back.

use crate::domain::money::Money;
use crate::error::{Result, ShopError};
use crate::infrastructure::session_file::SessionFile;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: u64,
    pub name: String,
    pub qty: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Unit price times quantity; a validation error if that does not fit.
    pub fn line_total(&self) -> Result<Money> {
        self.unit_price.checked_mul(Decimal::from(self.qty))
    }
}

/// The persisted part of the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn { user_id: Option<u64> },
    LoggedOut,
    /// The backend rejected the token; the token has been cleared.
    LoginRequired,
    CartChanged { items: usize },
}

pub struct Session {
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    file: Option<SessionFile>,
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Session {
    pub fn in_memory() -> Self {
        Self::with_state(SessionState::default(), None)
    }

    /// Loads the session from `file`, starting empty if it does not exist yet.
    pub fn load(file: SessionFile) -> Result<Self> {
        let state = file.load()?;
        Ok(Self::with_state(state, Some(file)))
    }

    fn with_state(state: SessionState, file: Option<SessionFile>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(state),
            events,
            file,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        debug!(?event, "session event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn persist(&self, state: &SessionState) -> Result<()> {
        match &self.file {
            Some(file) => file.save(state),
            None => Ok(()),
        }
    }

    fn update<F>(&self, mutate: F) -> Result<SessionState>
    where
        F: FnOnce(&mut SessionState) -> Result<()>,
    {
        let mut state = self.write();
        let previous = state.clone();
        let saved = mutate(&mut state).and_then(|()| self.persist(&state));
        if let Err(e) = saved {
            *state = previous;
            return Err(e);
        }
        Ok(state.clone())
    }

    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user_id(&self) -> Option<u64> {
        self.read().user_id
    }

    /// The current user id, or a validation error asking the user to log in.
    pub fn require_user(&self) -> Result<u64> {
        self.user_id()
            .ok_or_else(|| ShopError::validation("No user in session, please log in."))
    }

    pub fn login(&self, token: impl Into<String>, user_id: Option<u64>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ShopError::validation("Token must not be empty."));
        }
        self.update(|s| {
            s.token = Some(token);
            s.user_id = user_id;
            Ok(())
        })?;
        self.publish(SessionEvent::LoggedIn { user_id });
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.update(|s| {
            s.token = None;
            s.user_id = None;
            Ok(())
        })?;
        self.publish(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Called by the HTTP client on a 401. The token is dropped even if the
    /// file cannot be saved; the request is already failing with `Unauthorized`.
    pub fn expire(&self) {
        {
            let mut state = self.write();
            state.token = None;
            if let Err(e) = self.persist(&state) {
                warn!(error = %e, "failed to persist expired session");
            }
        }
        self.publish(SessionEvent::LoginRequired);
    }

    pub fn cart(&self) -> Vec<CartItem> {
        self.read().cart.clone()
    }

    pub fn cart_total(&self) -> Result<Money> {
        let cart = self.read();
        let totals = cart
            .cart
            .iter()
            .map(CartItem::line_total)
            .collect::<Result<Vec<_>>>()?;
        Money::checked_sum(totals)
    }

    /// Adds an item, merging quantities when the product is already in the cart.
    pub fn add_to_cart(&self, item: CartItem) -> Result<()> {
        if item.qty == 0 {
            return Err(ShopError::validation("Quantity must be at least 1."));
        }
        let state = self.update(|s| {
            match s.cart.iter_mut().find(|c| c.product_id == item.product_id) {
                Some(existing) => {
                    existing.qty = existing
                        .qty
                        .checked_add(item.qty)
                        .ok_or_else(|| ShopError::validation("Quantity is too large."))?;
                }
                None => s.cart.push(item),
            }
            Ok(())
        })?;
        self.publish(SessionEvent::CartChanged {
            items: state.cart.len(),
        });
        Ok(())
    }

    /// Sets the quantity of a cart line; zero removes it.
    pub fn set_cart_qty(&self, product_id: u64, qty: u32) -> Result<()> {
        let state = self.update(|s| {
            if qty == 0 {
                s.cart.retain(|c| c.product_id != product_id);
            } else if let Some(existing) = s.cart.iter_mut().find(|c| c.product_id == product_id)
            {
                existing.qty = qty;
            }
            Ok(())
        })?;
        self.publish(SessionEvent::CartChanged {
            items: state.cart.len(),
        });
        Ok(())
    }

    pub fn remove_from_cart(&self, product_id: u64) -> Result<()> {
        self.set_cart_qty(product_id, 0)
    }

    pub fn clear_cart(&self) -> Result<()> {
        self.update(|s| {
            s.cart.clear();
            Ok(())
        })?;
        self.publish(SessionEvent::CartChanged { items: 0 });
        Ok(())
    }
}
