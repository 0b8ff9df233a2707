//! Application layer: the workflows behind the back-office screens.
//!
//! Each workflow talks to the backend only through the ports in
//! [`crate::domain::ports`] and runs every fetch inside a
//! [`scope::FetchScope`] owned by its caller.

pub mod dashboard;
pub mod media_selector;
pub mod scope;
pub mod session;
pub mod settlement;
pub mod settlement_desk;
