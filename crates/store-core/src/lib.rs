//! 商城核心业务库
//!
//! 游戏代练积分商城的领域模型、仓储和业务服务，HTTP 层见 `storefront-service`。
//!
//! ## 核心功能
//!
//! - **积分账户**：余额与预留积分，所有变动在数据库事务中完成
//! - **商品定价**：限时促销、阶梯价格和基础价格
//! - **订单流转**：下单预留、卖家接单、完成结算、取消释放
//! - **充值提现**：管理员审核后入账或扣除
//! - **申诉**：申诉成立退款，驳回恢复原状态
//! - **站内通知**：与业务操作同事务写入
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `pricing`: 价格计算
//! - `password`: 密码哈希
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层

pub mod error;
pub mod models;
pub mod password;
pub mod pricing;
pub mod repository;
pub mod service;

pub use error::{Result, StoreError};
pub use models::*;
pub use repository::{
    CastleRepository, LedgerRepository, NotificationRepository, OrderRepository,
    ProductRepository, ReclamationRepository, StatsRepository, UserRepository,
};
pub use service::{
    AccountService, CastleService, CatalogService, DashboardService, LedgerService,
    NotificationService, OrderService, ReclamationService, TopUpRequest, dto,
};
