//! 积分账本仓储
//!
//! 所有积分变动的唯一入口。每个变动方法都会先 `FOR UPDATE` 锁定用户行，
//! 用 `Balance` 校验后再写回，并且必须在调用方的事务中执行。

use sqlx::{PgConnection, PgPool};
use tracing::debug;

use store_shared::observability::metrics;

use crate::error::{Result, StoreError};
use crate::models::{
    Balance, NewTransaction, Transaction, TransactionStatus, TransactionType,
};

const TRANSACTION_COLUMNS: &str = r#"
    id, user_id, type, amount, order_id, status, payment_method, receipt_url, notes,
    reviewed_by, created_at, updated_at
"#;

/// 积分账本仓储
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 余额 ====================

    /// 锁定用户行并读取余额
    pub async fn lock_balance_in_tx(tx: &mut PgConnection, user_id: i64) -> Result<Balance> {
        sqlx::query_as::<_, Balance>(
            "SELECT points, reserved_points FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(tx)
        .await?
        .ok_or(StoreError::UserNotFound(user_id))
    }

    /// 按 ID 升序锁定多个用户，避免并发事务交叉加锁导致死锁
    pub async fn lock_users_in_tx(tx: &mut PgConnection, user_ids: &[i64]) -> Result<()> {
        let mut ids = user_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        for id in ids {
            Self::lock_balance_in_tx(&mut *tx, id).await?;
        }
        Ok(())
    }

    async fn store_balance_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        balance: Balance,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET points = $2, reserved_points = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(balance.points)
        .bind(balance.reserved_points)
        .execute(tx)
        .await?;

        Ok(())
    }

    async fn apply_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        kind: &'static str,
        amount: i64,
        op: fn(Balance, i64) -> Result<Balance>,
    ) -> Result<Balance> {
        let current = Self::lock_balance_in_tx(&mut *tx, user_id).await?;
        let next = op(current, amount)?;
        Self::store_balance_in_tx(&mut *tx, user_id, next).await?;

        metrics::record_points_moved(kind, amount);
        debug!(
            user_id,
            kind,
            amount,
            points = next.points,
            reserved = next.reserved_points,
            "Points moved"
        );
        Ok(next)
    }

    /// 预留积分（要求可用积分 >= amount）
    pub async fn reserve_in_tx(tx: &mut PgConnection, user_id: i64, amount: i64) -> Result<Balance> {
        Self::apply_in_tx(tx, user_id, "reserve", amount, Balance::reserve).await
    }

    /// 释放预留积分
    pub async fn release_in_tx(tx: &mut PgConnection, user_id: i64, amount: i64) -> Result<Balance> {
        Self::apply_in_tx(tx, user_id, "release", amount, Balance::release).await
    }

    /// 扣除已预留的积分
    pub async fn capture_in_tx(tx: &mut PgConnection, user_id: i64, amount: i64) -> Result<Balance> {
        Self::apply_in_tx(tx, user_id, "capture", amount, Balance::capture).await
    }

    /// 入账
    pub async fn credit_in_tx(tx: &mut PgConnection, user_id: i64, amount: i64) -> Result<Balance> {
        Self::apply_in_tx(tx, user_id, "credit", amount, Balance::credit).await
    }

    /// 扣除可用积分
    pub async fn debit_in_tx(tx: &mut PgConnection, user_id: i64, amount: i64) -> Result<Balance> {
        Self::apply_in_tx(tx, user_id, "debit", amount, Balance::debit).await
    }

    // ==================== 交易记录 ====================

    /// 在事务中写入交易记录
    pub async fn create_transaction_in_tx(
        tx: &mut PgConnection,
        txn: &NewTransaction,
    ) -> Result<Transaction> {
        let sql = format!(
            r#"
            INSERT INTO transactions (user_id, type, amount, order_id, status, payment_method,
                                      receipt_url, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );
        let created = sqlx::query_as::<_, Transaction>(&sql)
            .bind(txn.user_id)
            .bind(txn.kind)
            .bind(txn.amount)
            .bind(txn.order_id)
            .bind(txn.status)
            .bind(&txn.payment_method)
            .bind(&txn.receipt_url)
            .bind(&txn.notes)
            .fetch_one(tx)
            .await?;

        Ok(created)
    }

    /// 锁定并读取交易记录
    pub async fn get_transaction_for_update_in_tx(
        tx: &mut PgConnection,
        id: i64,
    ) -> Result<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE id = $1 FOR UPDATE",
            TRANSACTION_COLUMNS
        );
        let txn = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(txn)
    }

    /// 记录审核结果
    ///
    /// `notes` 和 `receipt_url` 为 None 时保留原值
    pub async fn review_transaction_in_tx(
        tx: &mut PgConnection,
        id: i64,
        status: TransactionStatus,
        reviewer_id: i64,
        notes: Option<&str>,
        receipt_url: Option<&str>,
    ) -> Result<Transaction> {
        let sql = format!(
            r#"
            UPDATE transactions
            SET status = $2, reviewed_by = $3,
                notes = COALESCE($4, notes),
                receipt_url = COALESCE($5, receipt_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );
        let updated = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .bind(status)
            .bind(reviewer_id)
            .bind(notes)
            .bind(receipt_url)
            .fetch_one(tx)
            .await?;

        Ok(updated)
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = $1", TRANSACTION_COLUMNS);
        let txn = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(txn)
    }

    /// 列出用户的交易记录（时间倒序）
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            TRANSACTION_COLUMNS
        );
        let txns = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }

    /// 按类型和状态筛选交易记录
    pub async fn list(
        &self,
        kind: Option<TransactionType>,
        status: Option<TransactionStatus>,
    ) -> Result<Vec<Transaction>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE ($1::varchar IS NULL OR type = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#,
            TRANSACTION_COLUMNS
        );
        let txns = sqlx::query_as::<_, Transaction>(&sql)
            .bind(kind)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }
}
