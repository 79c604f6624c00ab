//! 响应 DTO 定义
//!
//! 所有 REST API 的响应体结构

use serde::Serialize;
use store_core::UserProfile;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 创建成功响应（无数据）
    pub fn success_empty() -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: None,
        }
    }
}

/// 登录/注册成功后的会话信息
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserProfile,
    /// 角色首页
    pub redirect_to: &'static str,
}

impl SessionResponse {
    pub fn new(user: UserProfile) -> Self {
        let redirect_to = user.role.home_path();
        Self { user, redirect_to }
    }
}

/// 充值申请提交结果
///
/// 上传接口沿用表单提交方的约定，不使用 `ApiResponse` 包装：
/// `{"success": true, "transactionId": 12}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResponse {
    pub success: bool,
    pub transaction_id: i64,
}

impl TopUpResponse {
    pub fn submitted(transaction_id: i64) -> Self {
        Self {
            success: true,
            transaction_id,
        }
    }
}

/// 数量结果（未读数、批量更新条数）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: i64,
}
