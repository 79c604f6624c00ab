//! 站内通知服务
//!
//! 业务流程在自己的事务里调用 `notify_in_tx` / `notify_admins_in_tx`，
//! 通知与状态变更一起提交或一起回滚。

use std::sync::Arc;

use sqlx::PgConnection;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::models::{NewNotification, Notification};
use crate::repository::{NotificationRepository, UserRepository};

/// 单次列表返回的最大条数
const LIST_LIMIT: i64 = 100;

/// 站内通知服务
pub struct NotificationService {
    notification_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    /// 通知单个用户（独立于业务事务）
    #[instrument(skip(self, notification), fields(title = %notification.title))]
    pub async fn notify(&self, user_id: i64, notification: &NewNotification) -> Result<i64> {
        self.notification_repo.create(user_id, notification).await
    }

    /// 在事务中通知单个用户
    pub async fn notify_in_tx(
        tx: &mut PgConnection,
        user_id: i64,
        notification: &NewNotification,
    ) -> Result<i64> {
        let id = NotificationRepository::create_in_tx(tx, user_id, notification).await?;
        debug!(user_id, notification_id = id, title = %notification.title, "Notification queued");
        Ok(id)
    }

    /// 在事务中通知全部管理员
    pub async fn notify_admins_in_tx(
        tx: &mut PgConnection,
        notification: &NewNotification,
    ) -> Result<u64> {
        let admin_ids = UserRepository::list_admin_ids_in_tx(&mut *tx).await?;
        let count = NotificationRepository::create_many_in_tx(tx, &admin_ids, notification).await?;
        debug!(count, title = %notification.title, "Admin notifications queued");
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn list_for(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>> {
        self.notification_repo
            .list(user_id, unread_only, LIST_LIMIT)
            .await
    }

    /// 标记已读；不属于该用户的通知视为不存在
    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: i64, id: i64) -> Result<()> {
        if !self.notification_repo.mark_read(user_id, id).await? {
            return Err(StoreError::NotificationNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        self.notification_repo.mark_all_read(user_id).await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        self.notification_repo.unread_count(user_id).await
    }
}
