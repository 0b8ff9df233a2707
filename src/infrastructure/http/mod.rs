//! The REST adapter: one shared client plus the port implementations.

pub mod client;
pub mod endpoints;
pub mod envelope;

pub use client::RestClient;
