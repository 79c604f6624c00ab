//! 城堡服务
//!
//! 买家维护自己的游戏账号信息。所有操作都限定在所有者范围内，
//! 访问他人的城堡与访问不存在的城堡返回同一个错误。

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::models::{Castle, CastleInput};
use crate::repository::CastleRepository;

/// 城堡服务
pub struct CastleService {
    castle_repo: Arc<CastleRepository>,
    pool: PgPool,
}

impl CastleService {
    pub fn new(castle_repo: Arc<CastleRepository>, pool: PgPool) -> Self {
        Self { castle_repo, pool }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Castle>> {
        self.castle_repo.list_by_user(user_id).await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Castle> {
        self.castle_repo
            .get_owned(user_id, id)
            .await?
            .ok_or(StoreError::CastleNotFound(id))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: i64, input: CastleInput) -> Result<Castle> {
        validate_input(&input)?;
        let castle = self.castle_repo.create(user_id, &input).await?;
        info!(user_id, castle_id = castle.id, "Castle created");
        Ok(castle)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, user_id: i64, id: i64, input: CastleInput) -> Result<Castle> {
        validate_input(&input)?;
        let castle = self
            .castle_repo
            .update(user_id, id, &input)
            .await?
            .ok_or(StoreError::CastleNotFound(id))?;
        info!(user_id, castle_id = id, "Castle updated");
        Ok(castle)
    }

    /// 删除城堡
    ///
    /// 仍被非终态订单引用时返回 `CastleInUse`；只被历史订单引用时归档而不是物理删除。
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let (open_orders, all_orders) =
            CastleRepository::lock_and_count_orders_in_tx(&mut tx, user_id, id)
                .await?
                .ok_or(StoreError::CastleNotFound(id))?;

        if open_orders > 0 {
            return Err(StoreError::CastleInUse(id));
        }

        if all_orders > 0 {
            CastleRepository::archive_in_tx(&mut tx, user_id, id).await?;
            info!(user_id, castle_id = id, "Castle archived");
        } else {
            CastleRepository::delete_in_tx(&mut tx, user_id, id).await?;
            info!(user_id, castle_id = id, "Castle deleted");
        }

        tx.commit().await?;
        Ok(())
    }
}

fn validate_input(input: &CastleInput) -> Result<()> {
    let fields = [
        ("name", &input.name),
        ("iggId", &input.igg_id),
        ("castleId", &input.castle_id),
        ("loginCredentials", &input.login_credentials),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{} 不能为空", field)));
        }
    }
    Ok(())
}
