//! 订单仓储
//!
//! 状态变更方法只做持久化，状态机校验和积分变动由 `OrderService` 负责

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Order, OrderStatus, OrderView};

const ORDER_COLUMNS: &str = r#"
    id, customer_id, seller_id, product_id, castle_id, quantity, unit_price, amount, status,
    settled_at, created_at, updated_at
"#;

const ORDER_VIEW_SELECT: &str = r#"
    SELECT o.id, o.customer_id, cu.username AS customer_name,
           o.seller_id, su.username AS seller_name,
           o.product_id, p.name AS product_name,
           o.castle_id, c.name AS castle_name, c.igg_id, c.castle_id AS game_castle_id,
           c.login_credentials,
           o.quantity, o.unit_price, o.amount, o.status, o.settled_at,
           o.created_at, o.updated_at
    FROM orders o
    JOIN users cu ON cu.id = o.customer_id
    LEFT JOIN users su ON su.id = o.seller_id
    JOIN products p ON p.id = o.product_id
    JOIN castles c ON c.id = o.castle_id
"#;

/// 新建订单参数
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: i64,
    pub product_id: i64,
    pub castle_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
    pub amount: i64,
}

/// 订单列表筛选条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    /// 买家自己的订单
    Customer(i64),
    /// 分配给卖家的订单
    Seller(i64),
    /// 待接单（pending 且未分配）
    Available,
    /// 全部订单，可按状态筛选
    All(Option<OrderStatus>),
}

/// 订单仓储
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中创建 pending 订单
    pub async fn create_in_tx(tx: &mut PgConnection, order: &NewOrder) -> Result<Order> {
        let sql = format!(
            r#"
            INSERT INTO orders (customer_id, product_id, castle_id, quantity, unit_price, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.customer_id)
            .bind(order.product_id)
            .bind(order.castle_id)
            .bind(order.quantity)
            .bind(order.unit_price)
            .bind(order.amount)
            .fetch_one(tx)
            .await?;

        Ok(created)
    }

    /// 锁定并读取订单
    pub async fn get_for_update_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(order)
    }

    /// 在事务中条件接单
    ///
    /// 只有 pending 且未分配的订单会被更新；并发接单时只有一个事务能拿到返回行。
    pub async fn claim_in_tx(
        tx: &mut PgConnection,
        id: i64,
        seller_id: i64,
    ) -> Result<Option<Order>> {
        let sql = format!(
            r#"
            UPDATE orders
            SET seller_id = $2, status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND seller_id IS NULL
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(seller_id)
            .fetch_optional(tx)
            .await?;

        Ok(order)
    }

    /// 更新订单状态
    pub async fn set_status_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: OrderStatus,
    ) -> Result<Order> {
        let sql = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .fetch_one(tx)
            .await?;

        Ok(order)
    }

    /// 卖家放弃订单：回到 pending 并清空卖家
    pub async fn unassign_in_tx(tx: &mut PgConnection, id: i64) -> Result<Order> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = 'pending', seller_id = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_one(tx)
            .await?;

        Ok(order)
    }

    /// 完成并记录结算时间
    pub async fn complete_in_tx(tx: &mut PgConnection, id: i64) -> Result<Order> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = 'completed', settled_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_one(tx)
            .await?;

        Ok(order)
    }

    /// 获取订单展示视图（含凭证，由服务层决定是否脱敏）
    pub async fn get_view(&self, id: i64) -> Result<Option<OrderView>> {
        let sql = format!("{} WHERE o.id = $1", ORDER_VIEW_SELECT);
        let view = sqlx::query_as::<_, OrderView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(view)
    }

    /// 按筛选条件列出订单视图，`limit` 为 None 时不限制条数
    pub async fn list_views(&self, filter: OrderFilter, limit: Option<i64>) -> Result<Vec<OrderView>> {
        let (condition, id, status) = match filter {
            OrderFilter::Customer(id) => ("o.customer_id = $1", Some(id), None),
            OrderFilter::Seller(id) => ("o.seller_id = $1", Some(id), None),
            OrderFilter::Available => (
                "o.status = 'pending' AND o.seller_id IS NULL AND $1::bigint IS NULL",
                None,
                None,
            ),
            OrderFilter::All(status) => ("$1::bigint IS NULL", None, status),
        };

        let sql = format!(
            r#"
            {}
            WHERE {} AND ($2::varchar IS NULL OR o.status = $2)
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3
            "#,
            ORDER_VIEW_SELECT, condition
        );
        let views = sqlx::query_as::<_, OrderView>(&sql)
            .bind(id)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(views)
    }

    /// 卖家正在处理的订单（accepted / in_progress）
    pub async fn list_active_for_seller(&self, seller_id: i64, limit: i64) -> Result<Vec<OrderView>> {
        let sql = format!(
            r#"
            {}
            WHERE o.seller_id = $1 AND o.status IN ('accepted', 'in_progress')
            ORDER BY o.updated_at DESC, o.id DESC
            LIMIT $2
            "#,
            ORDER_VIEW_SELECT
        );
        let views = sqlx::query_as::<_, OrderView>(&sql)
            .bind(seller_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(views)
    }
}
