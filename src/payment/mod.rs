//! # 支付发起模块

pub mod money;
pub mod service;
pub mod types;

pub use service::PaymentService;
pub use types::{
    CreditorDetails, InternalTransferRequest, PaymentInstruction, PaymentRequest, PaymentResult,
};
