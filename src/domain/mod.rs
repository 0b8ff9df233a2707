//! Domain types shared by the back-office screens and the ports they fetch through.

pub mod bank_account;
pub mod lenient;
pub mod media;
pub mod money;
pub mod order;
pub mod page;
pub mod ports;
pub mod settlement;
pub mod shop;
pub mod transaction;
