//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，业务规则在服务层
//! - 事务控制由调用方（服务层）决定，需要参与事务的操作提供 `*_in_tx` 版本
//! - 积分变动只能通过 `LedgerRepository` 的 `*_in_tx` 方法进行

mod castle_repo;
mod ledger_repo;
mod notification_repo;
mod order_repo;
mod product_repo;
mod reclamation_repo;
mod stats_repo;
mod traits;
mod user_repo;

pub use castle_repo::CastleRepository;
pub use ledger_repo::LedgerRepository;
pub use notification_repo::NotificationRepository;
pub use order_repo::{NewOrder, OrderFilter, OrderRepository};
pub use product_repo::ProductRepository;
pub use reclamation_repo::ReclamationRepository;
pub use stats_repo::StatsRepository;
pub use traits::*;
pub use user_repo::UserRepository;
