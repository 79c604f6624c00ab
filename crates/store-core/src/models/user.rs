//! 用户实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::balance::Balance;
use super::enums::Role;

/// 用户
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt 哈希，永不序列化输出
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub points: i64,
    pub reserved_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn balance(&self) -> Balance {
        Balance::new(self.points, self.reserved_points)
    }
}

/// 操作者身份
///
/// 由 HTTP 层从会话中解析后传入服务层，用于权限和可见性判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// 用户资料（对外展示）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub points: i64,
    pub reserved_points: i64,
    pub available_points: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        let available_points = user.balance().available();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            points: user.points,
            reserved_points: user.reserved_points,
            available_points,
            created_at: user.created_at,
        }
    }
}
