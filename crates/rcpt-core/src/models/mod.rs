//! Data models for receipts, inbound email and configuration.

pub mod config;
pub mod email;
pub mod receipt;
