//! 站内通知实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::NotificationType;

/// 站内通知
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub read: bool,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[sqlx(default)]
    pub reference_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建通知参数
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub reference_id: Option<i64>,
}

impl NewNotification {
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        reference_id: Option<i64>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            reference_id,
        }
    }
}
