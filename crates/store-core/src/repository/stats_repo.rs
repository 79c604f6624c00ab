//! 看板统计查询
//!
//! 只读聚合查询，不参与事务

use sqlx::PgPool;

use crate::error::Result;
use crate::models::{Balance, OrderStatus};
use crate::service::dto::{ActivityItem, AdminStats, SellerStats};

/// 看板统计仓储
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let stats = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
                (SELECT COUNT(*) FROM reclamations WHERE status = 'pending') AS open_reclamations,
                (SELECT COUNT(*) FROM transactions
                 WHERE type = 'top_up' AND status = 'pending') AS pending_topups
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// 最近动态：待审核充值、24 小时内的新订单、待处理申诉，按时间倒序合并
    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityItem>> {
        let items = sqlx::query_as::<_, ActivityItem>(
            r#"
            SELECT * FROM (
                SELECT 'transaction'::varchar AS kind, t.id, t.user_id, u.username,
                       t.type::varchar AS detail, t.amount, t.created_at
                FROM transactions t
                JOIN users u ON u.id = t.user_id
                WHERE t.type = 'top_up' AND t.status = 'pending'

                UNION ALL

                SELECT 'order'::varchar, o.id, o.customer_id, u.username,
                       o.status::varchar, o.amount, o.created_at
                FROM orders o
                JOIN users u ON u.id = o.customer_id
                WHERE o.created_at > NOW() - INTERVAL '24 hours'

                UNION ALL

                SELECT 'reclamation'::varchar, r.id, r.customer_id, u.username,
                       r.status::varchar, NULL::bigint, r.created_at
                FROM reclamations r
                JOIN users u ON u.id = r.customer_id
                WHERE r.status = 'pending'
            ) activity
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// 买家按状态分组的订单数
    pub async fn order_counts_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<(OrderStatus, i64)>> {
        let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM orders WHERE customer_id = $1 GROUP BY status",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn castle_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM castles WHERE user_id = $1 AND archived = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn balance(&self, user_id: i64) -> Result<Option<Balance>> {
        let balance = sqlx::query_as::<_, Balance>(
            "SELECT points, reserved_points FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    /// 卖家统计，用户不存在时返回 None
    pub async fn seller_stats(&self, seller_id: i64) -> Result<Option<SellerStats>> {
        let stats = sqlx::query_as::<_, SellerStats>(
            r#"
            SELECT
                u.points,
                u.reserved_points,
                (SELECT COUNT(*) FROM orders
                 WHERE status = 'pending' AND seller_id IS NULL) AS available_orders,
                (SELECT COUNT(*) FROM orders
                 WHERE seller_id = u.id AND status IN ('accepted', 'in_progress')) AS active_orders,
                (SELECT COUNT(*) FROM orders
                 WHERE seller_id = u.id AND status = 'completed') AS completed_orders
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }
}
