//! HTTP 层错误类型定义
//!
//! 所有错误统一渲染为 `{success, code, message, data}` 结构

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use store_core::StoreError;

/// 系统错误对外统一返回的提示
const GENERIC_MESSAGE: &str = "服务内部错误，请稍后重试";

/// HTTP 层错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("未登录: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("文件处理失败: {0}")]
    Upload(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::Store(err) => store_status(err),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Upload(_) => "UPLOAD_ERROR",
            Self::Store(err) => err.error_code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_system_error(&self) -> bool {
        match self {
            Self::Store(err) => !err.is_business_error(),
            Self::Internal(_) => true,
            _ => false,
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    use StoreError::*;
    match err {
        InvalidCredentials => StatusCode::UNAUTHORIZED,
        NotOrderParticipant(_) => StatusCode::FORBIDDEN,
        UserNotFound(_)
        | ProductNotFound(_)
        | CastleNotFound(_)
        | OrderNotFound(_)
        | TransactionNotFound(_)
        | ReclamationNotFound(_)
        | NotificationNotFound(_) => StatusCode::NOT_FOUND,
        DuplicateUser
        | InsufficientPoints { .. }
        | ProductUnavailable(_)
        | CastleInUse(_)
        | OrderAlreadyTaken(_)
        | InvalidTransition { .. }
        | TransactionNotPending(_)
        | ReclamationExists(_)
        | ReclamationNotPending(_) => StatusCode::CONFLICT,
        Validation(_) => StatusCode::BAD_REQUEST,
        Database(_) | Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if self.is_system_error() {
            tracing::error!(error = %self, code = self.error_code(), "Request failed");
            GENERIC_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// HTTP 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use store_core::OrderStatus;

    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (ApiError::Unauthorized("no session".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::Forbidden("admin only".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (ApiError::Validation("amount".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::Upload("too large".into()), StatusCode::BAD_REQUEST, "UPLOAD_ERROR"),
            (StoreError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (StoreError::DuplicateUser.into(), StatusCode::CONFLICT, "DUPLICATE_USER"),
            (
                StoreError::InsufficientPoints { required: 500, available: 100 }.into(),
                StatusCode::CONFLICT,
                "INSUFFICIENT_POINTS",
            ),
            (StoreError::OrderAlreadyTaken(1).into(), StatusCode::CONFLICT, "ORDER_ALREADY_TAKEN"),
            (
                StoreError::InvalidTransition {
                    order_id: 1,
                    from: OrderStatus::Completed,
                    to: OrderStatus::Cancelled,
                }
                .into(),
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
            ),
            (StoreError::NotOrderParticipant(2).into(), StatusCode::FORBIDDEN, "NOT_ORDER_PARTICIPANT"),
            (StoreError::OrderNotFound(3).into(), StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            (StoreError::CastleInUse(4).into(), StatusCode::CONFLICT, "CASTLE_IN_USE"),
            (StoreError::TransactionNotPending(5).into(), StatusCode::CONFLICT, "TRANSACTION_NOT_PENDING"),
            (StoreError::ReclamationExists(6).into(), StatusCode::CONFLICT, "RECLAMATION_EXISTS"),
            (StoreError::Validation("qty".into()).into(), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                StoreError::Database(sqlx::Error::PoolTimedOut).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
            ),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ]
    }

    #[test]
    fn test_all_variants_status_and_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            assert_eq!(error.status_code(), expected_status, "状态码不匹配: {expected_code}");
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[tokio::test]
    async fn test_into_response_body_structure() {
        let response = ApiError::from(StoreError::OrderAlreadyTaken(9)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("读取响应体失败");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "ORDER_ALREADY_TAKEN");
        assert!(body["message"].as_str().unwrap().contains('9'));
        assert!(body["data"].is_null());
    }

    /// 数据库错误不能把连接串或 SQL 细节暴露给客户端
    #[tokio::test]
    async fn test_system_errors_are_masked() {
        let response = ApiError::from(StoreError::Database(sqlx::Error::Protocol(
            "password authentication failed for user mohstore".into(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["message"], GENERIC_MESSAGE);
        assert!(!body_bytes.windows(8).any(|w| w == b"mohstore"));
    }
}
