//! 积分账务服务
//!
//! 充值和提现都需要管理员审核：
//!
//! - 充值：买家上传凭证生成 pending 记录，审核通过后入账
//! - 提现：卖家申请时即预留积分，审核通过扣除预留，驳回则释放

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument};

use store_shared::observability::metrics;

use crate::error::{Result, StoreError};
use crate::models::{
    NewNotification, NewTransaction, NotificationType, Transaction, TransactionStatus,
    TransactionType,
};
use crate::repository::LedgerRepository;
use crate::service::notification::NotificationService;

/// 充值申请
#[derive(Debug, Clone)]
pub struct TopUpRequest {
    pub customer_id: i64,
    pub amount: i64,
    pub payment_method: String,
    pub receipt_url: String,
    pub notes: Option<String>,
}

/// 积分账务服务
pub struct LedgerService {
    ledger_repo: Arc<LedgerRepository>,
    pool: PgPool,
}

impl LedgerService {
    pub fn new(ledger_repo: Arc<LedgerRepository>, pool: PgPool) -> Self {
        Self { ledger_repo, pool }
    }

    /// 提交充值申请并通知全部管理员
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, amount = request.amount))]
    pub async fn submit_topup(&self, request: TopUpRequest) -> Result<Transaction> {
        if request.amount <= 0 {
            return Err(StoreError::Validation("充值金额必须大于 0".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let txn = LedgerRepository::create_transaction_in_tx(
            &mut tx,
            &NewTransaction {
                user_id: request.customer_id,
                kind: TransactionType::TopUp,
                amount: request.amount,
                order_id: None,
                status: TransactionStatus::Pending,
                payment_method: Some(request.payment_method),
                receipt_url: Some(request.receipt_url),
                notes: request.notes,
            },
        )
        .await?;

        NotificationService::notify_admins_in_tx(
            &mut tx,
            &NewNotification::new(
                NotificationType::Payment,
                "New Top-up Request",
                format!(
                    "A new top-up request for {} points has been submitted.",
                    txn.amount
                ),
                Some(txn.id),
            ),
        )
        .await?;

        tx.commit().await?;

        info!(transaction_id = txn.id, customer_id = txn.user_id, amount = txn.amount, "Top-up submitted");
        Ok(txn)
    }

    /// 审核通过充值：入账
    #[instrument(skip(self))]
    pub async fn approve_topup(&self, admin_id: i64, id: i64) -> Result<Transaction> {
        self.review(admin_id, id, TransactionType::TopUp, true, None, None)
            .await
    }

    /// 驳回充值
    #[instrument(skip(self, notes))]
    pub async fn reject_topup(
        &self,
        admin_id: i64,
        id: i64,
        notes: Option<String>,
    ) -> Result<Transaction> {
        self.review(admin_id, id, TransactionType::TopUp, false, notes, None)
            .await
    }

    /// 卖家申请提现：预留积分并通知管理员
    #[instrument(skip(self, notes))]
    pub async fn request_payout(
        &self,
        seller_id: i64,
        amount: i64,
        payment_method: String,
        notes: Option<String>,
    ) -> Result<Transaction> {
        let mut tx = self.pool.begin().await?;

        LedgerRepository::reserve_in_tx(&mut tx, seller_id, amount).await?;
        let txn = LedgerRepository::create_transaction_in_tx(
            &mut tx,
            &NewTransaction {
                user_id: seller_id,
                kind: TransactionType::Payout,
                amount,
                order_id: None,
                status: TransactionStatus::Pending,
                payment_method: Some(payment_method),
                receipt_url: None,
                notes,
            },
        )
        .await?;

        NotificationService::notify_admins_in_tx(
            &mut tx,
            &NewNotification::new(
                NotificationType::Payment,
                "New Payout Request",
                format!("A seller requested a payout of {} points.", amount),
                Some(txn.id),
            ),
        )
        .await?;

        tx.commit().await?;

        info!(transaction_id = txn.id, seller_id, amount, "Payout requested");
        Ok(txn)
    }

    /// 审核通过提现：扣除预留积分，可附上打款凭证
    #[instrument(skip(self))]
    pub async fn approve_payout(
        &self,
        admin_id: i64,
        id: i64,
        receipt_url: Option<String>,
    ) -> Result<Transaction> {
        self.review(admin_id, id, TransactionType::Payout, true, None, receipt_url)
            .await
    }

    /// 驳回提现：释放预留积分
    #[instrument(skip(self, notes))]
    pub async fn reject_payout(
        &self,
        admin_id: i64,
        id: i64,
        notes: Option<String>,
    ) -> Result<Transaction> {
        self.review(admin_id, id, TransactionType::Payout, false, notes, None)
            .await
    }

    pub async fn list_transactions_for(&self, user_id: i64) -> Result<Vec<Transaction>> {
        self.ledger_repo.list_by_user(user_id).await
    }

    pub async fn list_transactions(
        &self,
        kind: Option<TransactionType>,
        status: Option<TransactionStatus>,
    ) -> Result<Vec<Transaction>> {
        self.ledger_repo.list(kind, status).await
    }

    pub async fn get_transaction(&self, id: i64) -> Result<Transaction> {
        self.ledger_repo
            .get_transaction(id)
            .await?
            .ok_or(StoreError::TransactionNotFound(id))
    }

    /// 审核充值或提现
    ///
    /// 记录必须是指定类型且处于 pending，积分变动与状态更新在同一事务中
    async fn review(
        &self,
        admin_id: i64,
        id: i64,
        kind: TransactionType,
        approve: bool,
        notes: Option<String>,
        receipt_url: Option<String>,
    ) -> Result<Transaction> {
        let mut tx = self.pool.begin().await?;

        let txn = LedgerRepository::get_transaction_for_update_in_tx(&mut tx, id)
            .await?
            .filter(|t| t.kind == kind)
            .ok_or(StoreError::TransactionNotFound(id))?;
        if txn.status != TransactionStatus::Pending {
            return Err(StoreError::TransactionNotPending(id));
        }

        match (kind, approve) {
            (TransactionType::TopUp, true) => {
                LedgerRepository::credit_in_tx(&mut tx, txn.user_id, txn.amount).await?;
            }
            (TransactionType::Payout, true) => {
                LedgerRepository::capture_in_tx(&mut tx, txn.user_id, txn.amount).await?;
            }
            (TransactionType::Payout, false) => {
                LedgerRepository::release_in_tx(&mut tx, txn.user_id, txn.amount).await?;
            }
            _ => {}
        }

        let status = if approve {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Rejected
        };
        let reviewed = LedgerRepository::review_transaction_in_tx(
            &mut tx,
            id,
            status,
            admin_id,
            notes.as_deref(),
            receipt_url.as_deref(),
        )
        .await?;

        NotificationService::notify_in_tx(
            &mut tx,
            txn.user_id,
            &review_notification(kind, approve, txn.amount, id),
        )
        .await?;

        tx.commit().await?;

        let outcome = if approve { "approved" } else { "rejected" };
        metrics::record_topup_review(kind.as_str(), outcome);
        info!(
            transaction_id = id,
            admin_id,
            user_id = txn.user_id,
            kind = kind.as_str(),
            outcome,
            "Transaction reviewed"
        );
        Ok(reviewed)
    }
}

fn review_notification(
    kind: TransactionType,
    approve: bool,
    amount: i64,
    transaction_id: i64,
) -> NewNotification {
    let (title, message) = match (kind, approve) {
        (TransactionType::Payout, true) => (
            "Payout Approved",
            format!("Your payout of {} points has been sent.", amount),
        ),
        (TransactionType::Payout, false) => (
            "Payout Rejected",
            format!(
                "Your payout of {} points was rejected and the points were returned.",
                amount
            ),
        ),
        (_, true) => (
            "Top-up Approved",
            format!("{} points have been added to your balance.", amount),
        ),
        (_, false) => (
            "Top-up Rejected",
            format!("Your top-up request for {} points was rejected.", amount),
        ),
    };
    NewNotification::new(NotificationType::Payment, title, message, Some(transaction_id))
}
