//! 中间件模块
//!
//! 提供会话解析和角色访问控制中间件

mod auth;

pub use auth::{GateDecision, decide, role_gate, session_middleware};
