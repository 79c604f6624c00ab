//! 商城枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化，
//! 数据库中统一以小写下划线字符串存储。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// 买家 - 充值积分、下单、申诉
    #[default]
    Customer,
    /// 卖家 - 接单并完成代练服务
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
            Self::Seller => "seller",
        }
    }

    /// 角色对应的首页路径
    pub fn home_path(&self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Customer => "/customer",
            Self::Seller => "/seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// 订单状态
///
/// 状态流转：
/// ```text
/// pending ──accept──> accepted ──start──> in_progress ──complete──> completed
///    │  <──release──     │                     │                        │
///    └──cancel──> cancelled <──(admin)─────────┘                        │
///                  accepted / in_progress / completed ──reclamation──> disputed
///                  disputed ──resolve──> refunded
///                  disputed ──reject──> 申诉前的状态
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
        }
    }

    /// 检查状态是否可以流转到目标状态
    ///
    /// 不包含申诉驳回时的恢复，见 `can_restore_to`
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Pending)
                | (Accepted, InProgress)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
                | (Accepted, Disputed)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
                | (InProgress, Disputed)
                | (Completed, Disputed)
                | (Disputed, Refunded)
        )
    }

    /// 申诉驳回时能否恢复到目标状态（即申诉前的状态）
    pub fn can_restore_to(&self, target: OrderStatus) -> bool {
        *self == Self::Disputed && target.is_disputable()
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }

    /// 订单是否仍占用买家的预留积分
    ///
    /// 结算前的非终态订单都持有预留；结算后由 settled_at 标记。
    pub fn holds_reservation(&self, settled: bool) -> bool {
        !settled && !self.is_terminal()
    }

    /// 卖家正在处理中的状态
    pub fn is_active_for_seller(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress)
    }

    /// 可以发起申诉的状态
    pub fn is_disputable(&self) -> bool {
        matches!(self, Self::Accepted | Self::InProgress | Self::Completed)
    }

    /// 尚未结束的订单，其引用的城堡不能删除或归档
    pub const OPEN: [OrderStatus; 4] = [
        Self::Pending,
        Self::Accepted,
        Self::InProgress,
        Self::Disputed,
    ];

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "disputed" => Ok(Self::Disputed),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// 积分交易类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
pub enum TransactionType {
    /// 充值（+）- 管理员审核通过后入账
    TopUp,
    /// 支付（-）- 订单完成时从买家扣除
    Payment,
    /// 退款（+）- 申诉成立后退回买家
    Refund,
    /// 提现（-）- 卖家申请，管理员审核
    Payout,
    /// 收入（+）- 订单完成时计入卖家
    Earning,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::Payout => "payout",
            Self::Earning => "earning",
        }
    }

    /// 需要管理员审核的交易类型
    pub fn requires_review(&self) -> bool {
        matches!(self, Self::TopUp | Self::Payout)
    }
}

/// 交易状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

/// 申诉状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ReclamationStatus {
    #[default]
    Pending,
    /// 申诉成立，订单退款
    Resolved,
    /// 申诉驳回，订单恢复原状态
    Rejected,
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum NotificationType {
    Order,
    Payment,
    Reclamation,
    System,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_happy_path() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Accepted));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::InProgress));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_order_status_release_and_cancel() {
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::InProgress.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_order_status_dispute_flow() {
        assert!(OrderStatus::Completed.can_transition_to(OrderStatus::Disputed));
        assert!(OrderStatus::InProgress.can_transition_to(OrderStatus::Disputed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Disputed));
        assert!(OrderStatus::Disputed.can_transition_to(OrderStatus::Refunded));
        // 申诉期间卖家不能直接完成订单
        assert!(!OrderStatus::Disputed.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Disputed.can_restore_to(OrderStatus::Completed));
        assert!(OrderStatus::Disputed.can_restore_to(OrderStatus::InProgress));
        assert!(!OrderStatus::Disputed.can_restore_to(OrderStatus::Pending));
        assert!(!OrderStatus::Completed.can_restore_to(OrderStatus::Accepted));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::Disputed,
            OrderStatus::Refunded,
        ];
        for terminal in [OrderStatus::Cancelled, OrderStatus::Refunded] {
            assert!(terminal.is_terminal());
            for target in all {
                assert!(
                    !terminal.can_transition_to(target),
                    "{} -> {} should be rejected",
                    terminal,
                    target
                );
            }
        }
    }

    #[test]
    fn test_holds_reservation() {
        assert!(OrderStatus::Pending.holds_reservation(false));
        assert!(OrderStatus::Disputed.holds_reservation(false));
        assert!(!OrderStatus::Disputed.holds_reservation(true));
        assert!(!OrderStatus::Cancelled.holds_reservation(false));
    }

    #[test]
    fn test_open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Disputed.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
        assert!(!OrderStatus::Refunded.is_open());
    }

    #[test]
    fn test_order_status_roundtrip_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::InProgress,
            OrderStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::TopUp).unwrap(),
            "\"top_up\""
        );
        assert_eq!(serde_json::to_string(&Role::Seller).unwrap(), "\"seller\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_home_path() {
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::Customer.home_path(), "/customer");
        assert_eq!(Role::Seller.home_path(), "/seller");
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
    }

    #[test]
    fn test_review_types() {
        assert!(TransactionType::TopUp.requires_review());
        assert!(TransactionType::Payout.requires_review());
        assert!(!TransactionType::Earning.requires_review());
    }
}
