//! 商城领域错误类型
//!
//! 定义服务层的业务错误和系统错误

use thiserror::Error;

use crate::models::OrderStatus;

/// 商城服务错误类型
#[derive(Debug, Error)]
pub enum StoreError {
    // === 用户相关错误 ===
    #[error("用户不存在: {0}")]
    UserNotFound(i64),

    #[error("用户名或邮箱已被注册")]
    DuplicateUser,

    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("积分不足: 需要 {required}, 可用 {available}")]
    InsufficientPoints { required: i64, available: i64 },

    // === 商品相关错误 ===
    #[error("商品不存在: {0}")]
    ProductNotFound(i64),

    #[error("商品已下架: {0}")]
    ProductUnavailable(i64),

    // === 城堡相关错误 ===
    #[error("城堡不存在: {0}")]
    CastleNotFound(i64),

    #[error("城堡仍被进行中的订单引用: {0}")]
    CastleInUse(i64),

    // === 订单相关错误 ===
    #[error("订单不存在: {0}")]
    OrderNotFound(i64),

    #[error("订单已被其他卖家接单: {0}")]
    OrderAlreadyTaken(i64),

    #[error("订单状态不允许此操作: order_id={order_id}, {from} -> {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("无权操作该订单: {0}")]
    NotOrderParticipant(i64),

    // === 交易与申诉 ===
    #[error("交易记录不存在: {0}")]
    TransactionNotFound(i64),

    #[error("交易记录不处于待审核状态: {0}")]
    TransactionNotPending(i64),

    #[error("申诉不存在: {0}")]
    ReclamationNotFound(i64),

    #[error("该订单已有待处理的申诉: order_id={0}")]
    ReclamationExists(i64),

    #[error("申诉已处理: {0}")]
    ReclamationNotPending(i64),

    #[error("通知不存在: {0}")]
    NotificationNotFound(i64),

    // === 系统错误 ===
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 商城服务 Result 类型别名
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            Self::CastleNotFound(_) => "CASTLE_NOT_FOUND",
            Self::CastleInUse(_) => "CASTLE_IN_USE",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::OrderAlreadyTaken(_) => "ORDER_ALREADY_TAKEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotOrderParticipant(_) => "NOT_ORDER_PARTICIPANT",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::TransactionNotPending(_) => "TRANSACTION_NOT_PENDING",
            Self::ReclamationNotFound(_) => "RECLAMATION_NOT_FOUND",
            Self::ReclamationExists(_) => "RECLAMATION_EXISTS",
            Self::ReclamationNotPending(_) => "RECLAMATION_NOT_PENDING",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 将唯一约束冲突映射为业务错误，其余数据库错误原样返回
    pub(crate) fn on_unique_violation(err: sqlx::Error, conflict: StoreError) -> StoreError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => conflict,
            _ => StoreError::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_business_error() {
        assert!(StoreError::OrderAlreadyTaken(1).is_business_error());
        assert!(
            StoreError::InsufficientPoints {
                required: 500,
                available: 200
            }
            .is_business_error()
        );
        assert!(!StoreError::Internal("boom".to_string()).is_business_error());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(StoreError::DuplicateUser.error_code(), "DUPLICATE_USER");
        assert_eq!(
            StoreError::OrderAlreadyTaken(7).error_code(),
            "ORDER_ALREADY_TAKEN"
        );
        assert_eq!(
            StoreError::TransactionNotPending(3).error_code(),
            "TRANSACTION_NOT_PENDING"
        );
        assert_eq!(
            StoreError::InvalidTransition {
                order_id: 1,
                from: OrderStatus::Completed,
                to: OrderStatus::Accepted,
            }
            .error_code(),
            "INVALID_TRANSITION"
        );
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::InsufficientPoints {
            required: 500,
            available: 200,
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("200"));

        let err = StoreError::InvalidTransition {
            order_id: 42,
            from: OrderStatus::Pending,
            to: OrderStatus::Completed,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("pending"));
        assert!(msg.contains("completed"));
    }

    #[test]
    fn test_non_unique_errors_pass_through() {
        let err = StoreError::on_unique_violation(sqlx::Error::RowNotFound, StoreError::DuplicateUser);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
