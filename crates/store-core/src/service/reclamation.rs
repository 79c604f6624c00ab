//! 申诉服务
//!
//! 买家对已接单、处理中或已完成的订单发起申诉，订单进入 disputed。
//! 管理员处理：
//!
//! - 申诉成立：订单退款。未结算时释放买家预留；已结算时从卖家扣回并退给买家
//! - 申诉驳回：订单恢复到申诉前的状态

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, instrument};

use crate::error::{Result, StoreError};
use crate::models::{
    NewNotification, NewTransaction, NotificationType, OrderStatus, Reclamation,
    ReclamationStatus, ReclamationView, TransactionType,
};
use crate::repository::{LedgerRepository, OrderRepository, ReclamationRepository};
use crate::service::notification::NotificationService;
use crate::service::order::{ensure_transition, invalid_transition, lock_order, record_transition};

/// 申诉服务
pub struct ReclamationService {
    reclamation_repo: Arc<ReclamationRepository>,
    pool: PgPool,
}

impl ReclamationService {
    pub fn new(reclamation_repo: Arc<ReclamationRepository>, pool: PgPool) -> Self {
        Self {
            reclamation_repo,
            pool,
        }
    }

    /// 买家发起申诉
    #[instrument(skip(self, description))]
    pub async fn file(
        &self,
        customer_id: i64,
        order_id: i64,
        description: &str,
    ) -> Result<Reclamation> {
        if description.trim().is_empty() {
            return Err(StoreError::Validation("申诉描述不能为空".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        if order.customer_id != customer_id {
            return Err(StoreError::OrderNotFound(order_id));
        }
        if order.status == OrderStatus::Disputed {
            return Err(StoreError::ReclamationExists(order_id));
        }
        if !order.status.is_disputable() {
            return Err(invalid_transition(&order, OrderStatus::Disputed));
        }

        let reclamation = ReclamationRepository::create_in_tx(
            &mut tx,
            order_id,
            customer_id,
            description.trim(),
            order.status,
        )
        .await?;
        OrderRepository::set_status_in_tx(&mut tx, order_id, OrderStatus::Disputed).await?;

        let notification = NewNotification::new(
            NotificationType::Reclamation,
            "New Reclamation",
            format!("A reclamation was filed for order #{}.", order_id),
            Some(reclamation.id),
        );
        NotificationService::notify_admins_in_tx(&mut tx, &notification).await?;
        if let Some(seller_id) = order.seller_id {
            NotificationService::notify_in_tx(&mut tx, seller_id, &notification).await?;
        }

        tx.commit().await?;

        record_transition(order.status, OrderStatus::Disputed);
        info!(reclamation_id = reclamation.id, order_id, customer_id, "Reclamation filed");
        Ok(reclamation)
    }

    /// 申诉成立：订单退款
    #[instrument(skip(self, notes))]
    pub async fn resolve(
        &self,
        admin_id: i64,
        id: i64,
        notes: Option<String>,
    ) -> Result<Reclamation> {
        let mut tx = self.pool.begin().await?;

        let reclamation = lock_pending(&mut tx, id).await?;
        let order = lock_order(&mut tx, reclamation.order_id).await?;
        ensure_transition(&order, OrderStatus::Refunded)?;

        if order.is_settled() {
            let seller_id = order
                .seller_id
                .ok_or_else(|| StoreError::Internal(format!("settled order {} has no seller", order.id)))?;
            LedgerRepository::lock_users_in_tx(&mut tx, &[order.customer_id, seller_id]).await?;
            LedgerRepository::debit_in_tx(&mut tx, seller_id, order.amount).await?;
            LedgerRepository::credit_in_tx(&mut tx, order.customer_id, order.amount).await?;
            LedgerRepository::create_transaction_in_tx(
                &mut tx,
                &NewTransaction::settled(
                    order.customer_id,
                    TransactionType::Refund,
                    order.amount,
                    order.id,
                ),
            )
            .await?;
        } else {
            LedgerRepository::release_in_tx(&mut tx, order.customer_id, order.amount).await?;
        }

        OrderRepository::set_status_in_tx(&mut tx, order.id, OrderStatus::Refunded).await?;
        let closed = ReclamationRepository::close_in_tx(
            &mut tx,
            id,
            ReclamationStatus::Resolved,
            notes.as_deref(),
        )
        .await?;

        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Reclamation,
                "Reclamation Resolved",
                format!(
                    "Your reclamation for order #{} was accepted. {} points were refunded.",
                    order.id, order.amount
                ),
                Some(id),
            ),
        )
        .await?;
        if let Some(seller_id) = order.seller_id {
            NotificationService::notify_in_tx(
                &mut tx,
                seller_id,
                &NewNotification::new(
                    NotificationType::Reclamation,
                    "Order Refunded",
                    format!("Order #{} was refunded after a reclamation.", order.id),
                    Some(id),
                ),
            )
            .await?;
        }

        tx.commit().await?;

        record_transition(order.status, OrderStatus::Refunded);
        info!(
            reclamation_id = id,
            order_id = order.id,
            admin_id,
            settled = order.is_settled(),
            "Reclamation resolved"
        );
        Ok(closed)
    }

    /// 申诉驳回：订单恢复到申诉前的状态
    #[instrument(skip(self, notes))]
    pub async fn reject(
        &self,
        admin_id: i64,
        id: i64,
        notes: Option<String>,
    ) -> Result<Reclamation> {
        let mut tx = self.pool.begin().await?;

        let reclamation = lock_pending(&mut tx, id).await?;
        let order = lock_order(&mut tx, reclamation.order_id).await?;
        let restored = reclamation.order_status_at_filing;
        if !order.status.can_restore_to(restored) {
            return Err(invalid_transition(&order, restored));
        }

        OrderRepository::set_status_in_tx(&mut tx, order.id, restored).await?;
        let closed = ReclamationRepository::close_in_tx(
            &mut tx,
            id,
            ReclamationStatus::Rejected,
            notes.as_deref(),
        )
        .await?;

        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Reclamation,
                "Reclamation Rejected",
                format!("Your reclamation for order #{} was rejected.", order.id),
                Some(id),
            ),
        )
        .await?;

        tx.commit().await?;

        record_transition(OrderStatus::Disputed, restored);
        info!(reclamation_id = id, order_id = order.id, admin_id, restored = %restored, "Reclamation rejected");
        Ok(closed)
    }

    pub async fn list_for_customer(&self, customer_id: i64) -> Result<Vec<ReclamationView>> {
        self.reclamation_repo.list_views(Some(customer_id), None).await
    }

    pub async fn list(&self, status: Option<ReclamationStatus>) -> Result<Vec<ReclamationView>> {
        self.reclamation_repo.list_views(None, status).await
    }
}

async fn lock_pending(tx: &mut sqlx::PgConnection, id: i64) -> Result<Reclamation> {
    let reclamation = ReclamationRepository::get_for_update_in_tx(tx, id)
        .await?
        .ok_or(StoreError::ReclamationNotFound(id))?;
    if reclamation.status != ReclamationStatus::Pending {
        return Err(StoreError::ReclamationNotPending(id));
    }
    Ok(reclamation)
}
