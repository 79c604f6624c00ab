//! MOHSTORE 商城服务
//!
//! 面向买家、卖家和管理员的 REST API。
//!
//! ## 核心功能
//!
//! - **会话**：登录后写入签名 Cookie，按路径前缀做角色访问控制
//! - **买家**：浏览商品、管理城堡、下单、申诉、上传凭证充值
//! - **卖家**：接单并推进订单，申请提现
//! - **管理员**：商品与阶梯价格、用户角色、充值/提现审核、申诉处理
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型定义
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: 会话解析与角色访问控制
//! - `routes`: 路由配置
//! - `session`: 会话 Cookie 读写
//! - `state`: 应用状态
//! - `uploads`: 充值凭证存储
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 会话：axum-extra SignedCookieJar
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod uploads;

pub use dto::ApiResponse;
pub use error::{ApiError, Result};
pub use session::CurrentUser;
pub use state::AppState;
