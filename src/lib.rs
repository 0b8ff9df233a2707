//! # shopdesk
//!
//! Back-office client for a multi-tenant e-commerce REST backend.
//!
//! The crate is split the same way as the screens that use it:
//!
//! - [`domain`]: order lines, bank accounts, shops, media and the settlement
//!   grouping rules, plus the ports the backend is reached through.
//! - [`application`]: the workflows (settlement desk, media selector,
//!   dashboard), the process-wide session and fetch cancellation scopes.
//! - [`infrastructure`]: the REST adapter, an in-memory backend and the
//!   session file.
//! - [`interfaces`]: CSV input and output for the command line.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;

pub use application::scope::FetchScope;
pub use application::session::{Session, SessionEvent};
pub use config::ClientConfig;
pub use error::{Result, ShopError};
pub use infrastructure::http::RestClient;
pub use infrastructure::in_memory::InMemoryBackend;
