//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod users;
pub mod banks;
pub mod connected_banks;
pub mod accounts;
pub mod payment_consents;
pub mod payments;

pub use users::Entity as Users;
pub use banks::Entity as Banks;
pub use connected_banks::Entity as ConnectedBanks;
pub use accounts::Entity as Accounts;
pub use payment_consents::Entity as PaymentConsents;
pub use payments::Entity as Payments;
