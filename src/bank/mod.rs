//! # 银行接入模块
//!
//! 银行注册表、HTTP 客户端、令牌缓存与可注入时钟

pub mod client;
pub mod clock;
pub mod registry;
pub mod token_cache;
pub mod types;

pub use client::{BankClient, ConsentAuth};
pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::{BankProvider, ProviderRegistry};
pub use token_cache::{BankTokenCache, CachedBankToken};
