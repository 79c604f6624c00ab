//! 用户仓储

use sqlx::{PgConnection, PgPool};

use crate::error::{Result, StoreError};
use crate::models::{Role, User};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, role, points, reserved_points, created_at, updated_at
"#;

/// 用户仓储
///
/// 不提供积分写入方法，积分变动统一走 `LedgerRepository`
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户，用户名或邮箱冲突时返回 `DuplicateUser`
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::on_unique_violation(e, StoreError::DuplicateUser))
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// 按邮箱查询（大小写不敏感）
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// 检查用户名或邮箱是否已被占用
    pub async fn exists(&self, username: &str, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users WHERE username = $1 OR LOWER(email) = LOWER($2)
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list(&self, role: Option<Role>) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE ($1::varchar IS NULL OR role = $1) ORDER BY id",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn update_role(&self, id: i64, role: Role) -> Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// 在事务中读取用户当前角色
    pub async fn role_in_tx(tx: &mut PgConnection, id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(tx)
            .await?;

        Ok(role)
    }

    /// 在事务中获取全部管理员 ID
    pub async fn list_admin_ids_in_tx(tx: &mut PgConnection) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE role = 'admin' ORDER BY id")
            .fetch_all(tx)
            .await?;

        Ok(ids)
    }
}
