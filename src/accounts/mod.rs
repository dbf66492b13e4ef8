//! # 账户同步模块
//!
//! 账户访问同意激活后，从银行拉取账户列表并写入本地快照。

pub mod sync;

pub use sync::{AccountSyncService, SyncSummary};
