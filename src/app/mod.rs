//! # 应用层
//!
//! 进程级共享上下文

pub mod context;

pub use context::AppContext;
