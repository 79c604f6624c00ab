//! 积分交易记录实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{TransactionStatus, TransactionType};

/// 积分交易记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    #[sqlx(default)]
    pub order_id: Option<i64>,
    pub status: TransactionStatus,
    #[sqlx(default)]
    pub payment_method: Option<String>,
    #[sqlx(default)]
    pub receipt_url: Option<String>,
    #[sqlx(default)]
    pub notes: Option<String>,
    #[sqlx(default)]
    pub reviewed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建交易记录参数
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: i64,
    pub kind: TransactionType,
    pub amount: i64,
    pub order_id: Option<i64>,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub receipt_url: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// 已完成的订单相关流水（支付、收入、退款）
    pub fn settled(user_id: i64, kind: TransactionType, amount: i64, order_id: i64) -> Self {
        Self {
            user_id,
            kind,
            amount,
            order_id: Some(order_id),
            status: TransactionStatus::Completed,
            payment_method: None,
            receipt_url: None,
            notes: None,
        }
    }
}
