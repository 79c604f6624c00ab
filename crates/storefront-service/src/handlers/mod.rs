//! HTTP 请求处理器模块
//!
//! 按角色划分：`customer`、`seller`、`admin` 分别对应 `/api/{role}` 下的端点，
//! `auth`、`notification`、`topup` 为跨角色的公共端点

pub mod admin;
pub mod auth;
pub mod customer;
pub mod dashboard;
pub mod health;
pub mod notification;
pub mod seller;
pub mod topup;
