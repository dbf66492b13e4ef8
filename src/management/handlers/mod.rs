//! # 请求处理器

pub mod accounts;
pub mod banks;
pub mod connections;
pub mod payment_consents;
pub mod payments;
pub mod system;
