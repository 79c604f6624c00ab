//! 商城领域模型
//!
//! 包含用户、商品、城堡、订单、积分交易、申诉、通知等核心实体定义

pub mod balance;
pub mod castle;
pub mod enums;
pub mod notification;
pub mod order;
pub mod product;
pub mod reclamation;
pub mod transaction;
pub mod user;

// 重新导出常用类型
pub use balance::Balance;
pub use castle::{Castle, CastleInput};
pub use enums::{
    NotificationType, OrderStatus, ReclamationStatus, Role, TransactionStatus, TransactionType,
};
pub use notification::{NewNotification, Notification};
pub use order::{Order, OrderView};
pub use product::{NewProduct, PriceTier, Product, ProductPatch, TierInput};
pub use reclamation::{Reclamation, ReclamationView};
pub use transaction::{NewTransaction, Transaction};
pub use user::{Actor, User, UserProfile};
