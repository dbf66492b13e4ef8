//! # 同意生命周期模块
//!
//! 账户访问同意（Connection）与支付同意共用一个状态机：
//! `requested → awaitingauthorization → active|approved → rejected|expired|revoked`。

pub mod connection;
pub mod payment_consent;
pub mod revocation;
pub mod state;
pub mod status;

use serde::Serialize;

pub use connection::{ConnectionService, InitiateConnection};
pub use payment_consent::{PaymentConsentRequest, PaymentConsentService, PaymentConsentType};
pub use revocation::{RevocationCoordinator, RevocationOutcome};
pub use status::{ConsentKind, ConsentStatus};

/// 发起操作的结果：`created` 为 false 表示返回的是已存在的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Initiated<T> {
    #[serde(flatten)]
    pub record: T,
    pub created: bool,
}

impl<T> Initiated<T> {
    pub const fn created(record: T) -> Self {
        Self { record, created: true }
    }

    pub const fn existing(record: T) -> Self {
        Self { record, created: false }
    }
}
