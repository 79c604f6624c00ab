//! 城堡仓储
//!
//! 所有查询都带 user_id 条件，越权访问表现为记录不存在

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{Castle, CastleInput, OrderStatus};

const CASTLE_COLUMNS: &str =
    "id, user_id, name, igg_id, castle_id, login_credentials, created_at, updated_at";

/// 城堡仓储
pub struct CastleRepository {
    pool: PgPool,
}

impl CastleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Castle>> {
        let sql = format!(
            "SELECT {} FROM castles WHERE user_id = $1 AND archived = FALSE ORDER BY created_at DESC, id DESC",
            CASTLE_COLUMNS
        );
        let castles = sqlx::query_as::<_, Castle>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(castles)
    }

    pub async fn get_owned(&self, user_id: i64, id: i64) -> Result<Option<Castle>> {
        let sql = format!(
            "SELECT {} FROM castles WHERE id = $1 AND user_id = $2 AND archived = FALSE",
            CASTLE_COLUMNS
        );
        let castle = sqlx::query_as::<_, Castle>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(castle)
    }

    /// 在事务中获取用户名下的城堡并加共享锁，防止下单期间被删除
    pub async fn get_owned_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        id: i64,
    ) -> Result<Option<Castle>> {
        let sql = format!(
            "SELECT {} FROM castles WHERE id = $1 AND user_id = $2 AND archived = FALSE FOR SHARE",
            CASTLE_COLUMNS
        );
        let castle = sqlx::query_as::<_, Castle>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(tx)
            .await?;

        Ok(castle)
    }

    pub async fn create(&self, user_id: i64, input: &CastleInput) -> Result<Castle> {
        let sql = format!(
            r#"
            INSERT INTO castles (user_id, name, igg_id, castle_id, login_credentials)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CASTLE_COLUMNS
        );
        let castle = sqlx::query_as::<_, Castle>(&sql)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.igg_id)
            .bind(&input.castle_id)
            .bind(&input.login_credentials)
            .fetch_one(&self.pool)
            .await?;

        Ok(castle)
    }

    pub async fn update(&self, user_id: i64, id: i64, input: &CastleInput) -> Result<Option<Castle>> {
        let sql = format!(
            r#"
            UPDATE castles
            SET name = $3, igg_id = $4, castle_id = $5, login_credentials = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND archived = FALSE
            RETURNING {}
            "#,
            CASTLE_COLUMNS
        );
        let castle = sqlx::query_as::<_, Castle>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.igg_id)
            .bind(&input.castle_id)
            .bind(&input.login_credentials)
            .fetch_optional(&self.pool)
            .await?;

        Ok(castle)
    }

    /// 在事务中删除城堡，返回是否删除了记录
    pub async fn delete_in_tx(tx: &mut PgConnection, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM castles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 在事务中归档城堡
    pub async fn archive_in_tx(tx: &mut PgConnection, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE castles SET archived = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 锁定城堡后统计其被引用的订单数
    ///
    /// 返回 (未结束订单数, 全部订单数)；不存在或不属于该用户时返回 None。
    /// 未结束的状态见 `OrderStatus::OPEN`
    pub async fn lock_and_count_orders_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        id: i64,
    ) -> Result<Option<(i64, i64)>> {
        let locked: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM castles WHERE id = $1 AND user_id = $2 AND archived = FALSE FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = ANY($2)),
                   COUNT(*)
            FROM orders
            WHERE castle_id = $1
            "#,
        )
        .bind(id)
        .bind(OrderStatus::OPEN.map(|s| s.as_str()).to_vec())
        .fetch_one(tx)
        .await?;

        Ok(Some(counts))
    }
}
