//! 站内通知仓储

use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, read, type, reference_id, created_at, updated_at";

/// 站内通知仓储
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 写入通知
    pub async fn create(&self, user_id: i64, notification: &NewNotification) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::create_in_tx(&mut conn, user_id, notification).await
    }

    /// 在事务中写入通知
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        notification: &NewNotification,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (user_id, title, message, type, reference_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.reference_id)
        .fetch_one(tx)
        .await?;

        Ok(id)
    }

    /// 在事务中向多个用户写入同一条通知
    pub async fn create_many_in_tx(
        tx: &mut PgConnection,
        user_ids: &[i64],
        notification: &NewNotification,
    ) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, title, message, type, reference_id)
            SELECT uid, $2, $3, $4, $5 FROM UNNEST($1::bigint[]) AS uid
            "#,
        )
        .bind(user_ids)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind)
        .bind(notification.reference_id)
        .execute(tx)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn list(&self, user_id: i64, unread_only: bool, limit: i64) -> Result<Vec<Notification>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR read = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
            NOTIFICATION_COLUMNS
        );
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    /// 标记单条已读，返回是否命中该用户的通知
    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, updated_at = NOW() WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
