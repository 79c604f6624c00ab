//! 服务层
//!
//! 实现商城业务逻辑，协调仓储层并控制事务边界。
//!
//! ## 模块结构
//!
//! - `account`: 注册、登录和角色管理
//! - `catalog`: 商品目录与报价
//! - `castle`: 买家城堡
//! - `order`: 订单状态机与结算
//! - `ledger`: 充值与提现审核
//! - `reclamation`: 申诉处理
//! - `notification`: 站内通知
//! - `dashboard`: 各角色看板
//! - `dto`: 数据传输对象定义

pub mod account;
pub mod castle;
pub mod catalog;
pub mod dashboard;
pub mod dto;
pub mod ledger;
pub mod notification;
pub mod order;
pub mod reclamation;

pub use account::AccountService;
pub use castle::CastleService;
pub use catalog::CatalogService;
pub use dashboard::DashboardService;
pub use dto::*;
pub use ledger::{LedgerService, TopUpRequest};
pub use notification::NotificationService;
pub use order::{OrderService, credentials_visible};
pub use reclamation::ReclamationService;
