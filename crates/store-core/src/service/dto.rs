//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Balance, OrderStatus, OrderView, PriceTier, Product};
use crate::pricing::PriceSource;

/// 商品列表项
///
/// 附带当前时刻单件购买的生效单价和全部阶梯价格
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: i64,
    pub price_source: PriceSource,
    pub promotion_active: bool,
    pub tiers: Vec<PriceTier>,
}

/// 按状态统计的订单数
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderCounts {
    pub pending: i64,
    pub accepted: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub disputed: i64,
    pub refunded: i64,
}

/// 管理员看板统计
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_products: i64,
    pub total_users: i64,
    pub pending_orders: i64,
    pub open_reclamations: i64,
    pub pending_topups: i64,
}

/// 最近动态条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    /// transaction / order / reclamation
    pub kind: String,
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    /// 交易类型或订单/申诉状态
    pub detail: String,
    #[sqlx(default)]
    pub amount: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 管理员看板
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub recent_activity: Vec<ActivityItem>,
}

/// 买家看板
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDashboard {
    pub balance: Balance,
    pub available_points: i64,
    pub order_counts: OrderCounts,
    pub castle_count: i64,
    pub recent_orders: Vec<OrderView>,
}

/// 卖家看板统计
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SellerStats {
    pub points: i64,
    pub reserved_points: i64,
    pub available_orders: i64,
    pub active_orders: i64,
    pub completed_orders: i64,
}

/// 卖家看板
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDashboard {
    pub stats: SellerStats,
    pub latest_available: Vec<OrderView>,
    pub latest_active: Vec<OrderView>,
}

impl OrderCounts {
    /// 由 (状态, 数量) 列表汇总
    pub fn from_rows(rows: &[(OrderStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            let slot = match status {
                OrderStatus::Pending => &mut counts.pending,
                OrderStatus::Accepted => &mut counts.accepted,
                OrderStatus::InProgress => &mut counts.in_progress,
                OrderStatus::Completed => &mut counts.completed,
                OrderStatus::Cancelled => &mut counts.cancelled,
                OrderStatus::Disputed => &mut counts.disputed,
                OrderStatus::Refunded => &mut counts.refunded,
            };
            *slot += count;
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.pending
            + self.accepted
            + self.in_progress
            + self.completed
            + self.cancelled
            + self.disputed
            + self.refunded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_counts_from_rows() {
        let counts = OrderCounts::from_rows(&[
            (OrderStatus::Pending, 2),
            (OrderStatus::Completed, 5),
            (OrderStatus::InProgress, 1),
        ]);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.completed, 5);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.refunded, 0);
        assert_eq!(counts.total(), 8);
    }
}
