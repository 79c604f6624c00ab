//! 城堡（买家游戏账号）实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 城堡
///
/// `login_credentials` 只对所有者和接单卖家可见
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Castle {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub igg_id: String,
    pub castle_id: String,
    pub login_credentials: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 城堡写入参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastleInput {
    pub name: String,
    pub igg_id: String,
    pub castle_id: String,
    pub login_credentials: String,
}
