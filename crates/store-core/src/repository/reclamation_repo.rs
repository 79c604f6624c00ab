//! 申诉仓储

use sqlx::{PgConnection, PgPool};

use crate::error::{Result, StoreError};
use crate::models::{OrderStatus, Reclamation, ReclamationStatus, ReclamationView};

const RECLAMATION_COLUMNS: &str = r#"
    id, order_id, customer_id, description, status, order_status_at_filing, admin_notes,
    created_at, updated_at
"#;

const RECLAMATION_VIEW_SELECT: &str = r#"
    SELECT r.id, r.order_id, r.customer_id, u.username AS customer_name,
           p.name AS product_name, o.amount, o.status AS order_status,
           r.description, r.status, r.admin_notes, r.created_at, r.updated_at
    FROM reclamations r
    JOIN orders o ON o.id = r.order_id
    JOIN users u ON u.id = r.customer_id
    JOIN products p ON p.id = o.product_id
"#;

/// 申诉仓储
pub struct ReclamationRepository {
    pool: PgPool,
}

impl ReclamationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 在事务中创建申诉
    ///
    /// 同一订单已有 pending 申诉时，部分唯一索引冲突映射为 `ReclamationExists`
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        order_id: i64,
        customer_id: i64,
        description: &str,
        order_status_at_filing: OrderStatus,
    ) -> Result<Reclamation> {
        let sql = format!(
            r#"
            INSERT INTO reclamations (order_id, customer_id, description, status, order_status_at_filing)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {}
            "#,
            RECLAMATION_COLUMNS
        );
        sqlx::query_as::<_, Reclamation>(&sql)
            .bind(order_id)
            .bind(customer_id)
            .bind(description)
            .bind(order_status_at_filing)
            .fetch_one(tx)
            .await
            .map_err(|e| StoreError::on_unique_violation(e, StoreError::ReclamationExists(order_id)))
    }

    /// 锁定并读取申诉
    pub async fn get_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Reclamation>> {
        let sql = format!(
            "SELECT {} FROM reclamations WHERE id = $1 FOR UPDATE",
            RECLAMATION_COLUMNS
        );
        let reclamation = sqlx::query_as::<_, Reclamation>(&sql)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(reclamation)
    }

    /// 记录处理结果
    pub async fn close_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: ReclamationStatus,
        admin_notes: Option<&str>,
    ) -> Result<Reclamation> {
        let sql = format!(
            r#"
            UPDATE reclamations
            SET status = $2, admin_notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            RECLAMATION_COLUMNS
        );
        let reclamation = sqlx::query_as::<_, Reclamation>(&sql)
            .bind(id)
            .bind(status)
            .bind(admin_notes)
            .fetch_one(tx)
            .await?;

        Ok(reclamation)
    }

    /// 列出申诉，可按买家和状态筛选
    pub async fn list_views(
        &self,
        customer_id: Option<i64>,
        status: Option<ReclamationStatus>,
    ) -> Result<Vec<ReclamationView>> {
        let sql = format!(
            r#"
            {}
            WHERE ($1::bigint IS NULL OR r.customer_id = $1)
              AND ($2::varchar IS NULL OR r.status = $2)
            ORDER BY r.created_at DESC, r.id DESC
            "#,
            RECLAMATION_VIEW_SELECT
        );
        let views = sqlx::query_as::<_, ReclamationView>(&sql)
            .bind(customer_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(views)
    }
}
