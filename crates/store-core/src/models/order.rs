//! 订单实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::OrderStatus;

/// 订单
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    #[sqlx(default)]
    pub seller_id: Option<i64>,
    pub product_id: i64,
    pub castle_id: i64,
    pub quantity: i32,
    pub unit_price: i64,
    pub amount: i64,
    pub status: OrderStatus,
    /// 积分结算时间，为空表示买家积分仍处于预留状态
    #[sqlx(default)]
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    /// 用户是否为订单的参与方（买家或已接单卖家）
    pub fn involves(&self, user_id: i64) -> bool {
        self.customer_id == user_id || self.seller_id == Some(user_id)
    }
}

/// 订单展示视图
///
/// 关联了商品名、城堡信息和双方用户名。`login_credentials` 只在
/// 查看者有权获取时填充。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    #[sqlx(default)]
    pub seller_id: Option<i64>,
    #[sqlx(default)]
    pub seller_name: Option<String>,
    pub product_id: i64,
    pub product_name: String,
    pub castle_id: i64,
    pub castle_name: String,
    pub igg_id: String,
    pub game_castle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[sqlx(default)]
    pub login_credentials: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub amount: i64,
    pub status: OrderStatus,
    #[sqlx(default)]
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn without_credentials(mut self) -> Self {
        self.login_credentials = None;
        self
    }
}
