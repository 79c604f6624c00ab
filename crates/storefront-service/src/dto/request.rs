//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构

use serde::Deserialize;
use store_core::{
    CastleInput, OrderStatus, ReclamationStatus, Role, TransactionStatus, TransactionType,
};
use validator::Validate;

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "用户名长度必须在 3-50 之间"))]
    pub username: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 6, max = 100, message = "密码长度必须在 6-100 之间"))]
    pub password: String,
}

/// 登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255, message = "邮箱不能为空"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "密码不能为空"))]
    pub password: String,
}

/// 下单请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: i64,
    pub castle_id: i64,
    #[validate(range(min = 1, max = 10000, message = "数量必须在 1-10000 之间"))]
    pub quantity: i32,
}

/// 报价查询
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    #[validate(range(min = 1, message = "数量必须大于 0"))]
    pub quantity: i32,
}

/// 城堡创建/更新请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CastleRequest {
    #[validate(length(min = 1, max = 100, message = "城堡名称长度必须在 1-100 之间"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "IGG ID 长度必须在 1-100 之间"))]
    pub igg_id: String,
    #[validate(length(min = 1, max = 100, message = "城堡 ID 长度必须在 1-100 之间"))]
    pub castle_id: String,
    #[validate(length(min = 1, max = 1000, message = "登录凭证不能为空"))]
    pub login_credentials: String,
}

impl From<CastleRequest> for CastleInput {
    fn from(req: CastleRequest) -> Self {
        Self {
            name: req.name,
            igg_id: req.igg_id,
            castle_id: req.castle_id,
            login_credentials: req.login_credentials,
        }
    }
}

/// 发起申诉请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReclamationRequest {
    #[validate(length(min = 1, max = 2000, message = "申诉描述长度必须在 1-2000 之间"))]
    pub description: String,
}

/// 审核备注（驳回充值/提现、处理申诉）
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[validate(length(max = 1000, message = "备注不能超过 1000 个字符"))]
    pub notes: Option<String>,
}

/// 审核通过提现，可附打款凭证
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayoutRequest {
    #[validate(length(max = 500, message = "凭证地址过长"))]
    pub receipt_url: Option<String>,
}

/// 卖家提现申请
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    #[validate(range(min = 1, message = "提现积分必须大于 0"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 100, message = "收款方式长度必须在 1-100 之间"))]
    pub payment_method: String,
    #[validate(length(max = 1000, message = "备注不能超过 1000 个字符"))]
    pub notes: Option<String>,
}

/// 修改用户角色
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// 用户列表筛选
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub role: Option<Role>,
}

/// 订单列表筛选
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// 待接单列表
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuery {
    pub limit: Option<i64>,
}

/// 交易列表筛选
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

/// 申诉列表筛选
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReclamationQuery {
    pub status: Option<ReclamationStatus>,
}

/// 通知列表筛选
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            username: "al".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_order_quantity_must_be_positive() {
        let req: CreateOrderRequest =
            serde_json::from_str(r#"{"productId":1,"castleId":2,"quantity":0}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_transaction_query_type_alias() {
        let query: TransactionQuery =
            serde_json::from_str(r#"{"type":"top_up","status":"pending"}"#).unwrap();
        assert_eq!(query.kind, Some(TransactionType::TopUp));
        assert_eq!(query.status, Some(TransactionStatus::Pending));
    }

    #[test]
    fn test_payout_validation() {
        let req = PayoutRequest {
            amount: 0,
            payment_method: "paypal".to_string(),
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}
