//! # Open Banking Bridge Library
//!
//! 银行同意生命周期、银行令牌缓存与幂等支付发起

pub mod accounts;
pub mod app;
pub mod auth;
pub mod bank;
pub mod config;
pub mod consent;
pub mod database;
pub mod error;
pub mod logging;
pub mod management;
pub mod payment;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{BridgeError, Result};
