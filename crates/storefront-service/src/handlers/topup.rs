//! 充值申请处理器
//!
//! 买家以 multipart 表单提交充值金额、支付方式和付款凭证，
//! 凭证保存后生成待审核的充值记录

use axum::{
    Json,
    extract::{Multipart, State},
};
use store_core::TopUpRequest;
use tracing::{info, warn};

use crate::dto::TopUpResponse;
use crate::error::{ApiError, Result};
use crate::session::CurrentUser;
use crate::state::AppState;
use crate::uploads::validate_receipt;

/// 支付方式缺省值
const DEFAULT_PAYMENT_METHOD: &str = "bank_transfer";

/// 解析后的充值表单
#[derive(Debug, Default)]
pub struct TopUpForm {
    pub amount: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// 原始文件名与内容
    pub receipt: Option<(String, Vec<u8>)>,
}

impl TopUpForm {
    /// 从 multipart 请求中读取字段，未知字段忽略
    pub async fn read(multipart: &mut Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(format!("无效的表单数据: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "receipt" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Upload(format!("凭证读取失败: {}", e)))?;
                    form.receipt = Some((filename, data.to_vec()));
                }
                "amount" | "paymentMethod" | "notes" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(format!("无效的表单字段 {}: {}", name, e)))?;
                    let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                    match name.as_str() {
                        "amount" => form.amount = value,
                        "paymentMethod" => form.payment_method = value,
                        _ => form.notes = value,
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// 校验金额并返回整数积分
    pub fn parse_amount(&self) -> Result<i64> {
        self.amount
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|amount| *amount > 0)
            .ok_or_else(|| ApiError::Validation("充值金额必须是大于 0 的整数".to_string()))
    }
}

/// 提交充值申请
///
/// POST /api/topup
///
/// 充值记录写入失败时删除已保存的凭证
pub async fn submit_topup(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<TopUpResponse>> {
    let form = TopUpForm::read(&mut multipart).await?;

    let amount = form.parse_amount()?;
    let (filename, data) = form
        .receipt
        .ok_or_else(|| ApiError::Validation("请上传付款凭证".to_string()))?;
    let extension = validate_receipt(&filename, &data, state.max_upload_bytes)?;

    let receipt_url = state.receipts.save(&extension, data).await?;

    let submitted = state
        .ledger
        .submit_topup(TopUpRequest {
            customer_id: user.id,
            amount,
            payment_method: form
                .payment_method
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            receipt_url: receipt_url.clone(),
            notes: form.notes,
        })
        .await;

    let transaction = match submitted {
        Ok(transaction) => transaction,
        Err(err) => {
            if let Err(cleanup) = state.receipts.remove(&receipt_url).await {
                warn!(receipt_url = %receipt_url, error = %cleanup, "Failed to remove orphaned receipt");
            }
            return Err(err.into());
        }
    };

    info!(
        transaction_id = transaction.id,
        customer_id = user.id,
        amount,
        "Top-up submitted"
    );

    Ok(Json(TopUpResponse::submitted(transaction.id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(amount: Option<&str>) -> TopUpForm {
        TopUpForm {
            amount: amount.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(form(Some("250")).parse_amount().unwrap(), 250);

        assert!(form(None).parse_amount().is_err());
        assert!(form(Some("0")).parse_amount().is_err());
        assert!(form(Some("-5")).parse_amount().is_err());
        assert!(form(Some("12.5")).parse_amount().is_err());
        assert!(form(Some("abc")).parse_amount().is_err());
    }
}
