//! # 管理API模块
//!
//! 提供RESTful API接口：银行列表、账户访问同意、支付同意与支付

pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;

pub use routes::create_routes;
pub use server::{AppState, ManagementServer};
