//! # 认证模块
//!
//! API 调用方的 JWT 校验与 Axum 认证中间件

pub mod jwt;
pub mod middleware;

pub use jwt::{JwtClaims, JwtManager};
pub use middleware::AuthContext;
