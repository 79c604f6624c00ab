//! 申诉实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{OrderStatus, ReclamationStatus};

/// 申诉
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reclamation {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub description: String,
    pub status: ReclamationStatus,
    /// 发起申诉时订单所处状态，驳回时据此恢复
    pub order_status_at_filing: OrderStatus,
    #[sqlx(default)]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 申诉列表视图
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReclamationView {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub product_name: String,
    pub amount: i64,
    pub order_status: OrderStatus,
    pub description: String,
    pub status: ReclamationStatus,
    #[sqlx(default)]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
