//! 订单服务
//!
//! 订单状态机与积分结算。每次状态变更都在单个数据库事务中完成：
//!
//! 1. `FOR UPDATE` 锁定订单行
//! 2. 校验操作者身份与状态流转
//! 3. 按用户 ID 升序锁定涉及的用户行并变动积分
//! 4. 更新订单、写入交易流水和对方的站内通知
//! 5. 提交事务
//!
//! 接单是例外：使用条件更新 `WHERE status = 'pending' AND seller_id IS NULL`，
//! 并发接单只有一个卖家成功，其余返回 `OrderAlreadyTaken`。

use std::sync::Arc;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use store_shared::observability::metrics;

use crate::error::{Result, StoreError};
use crate::models::{
    Actor, NewNotification, NewTransaction, NotificationType, Order, OrderStatus, OrderView, Role,
    TransactionType,
};
use crate::pricing;
use crate::repository::{
    CastleRepository, LedgerRepository, NewOrder, OrderFilter, OrderRepository, ProductRepository,
    UserRepository,
};
use crate::service::notification::NotificationService;

/// 订单服务
pub struct OrderService {
    order_repo: Arc<OrderRepository>,
    pool: PgPool,
}

impl OrderService {
    pub fn new(order_repo: Arc<OrderRepository>, pool: PgPool) -> Self {
        Self { order_repo, pool }
    }

    /// 买家下单
    ///
    /// 按当前价格计算总价并预留积分；可用积分不足时返回 `InsufficientPoints`
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        customer_id: i64,
        product_id: i64,
        castle_id: i64,
        quantity: i32,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let product = ProductRepository::get_in_tx(&mut tx, product_id)
            .await?
            .ok_or(StoreError::ProductNotFound(product_id))?;
        if !product.active {
            return Err(StoreError::ProductUnavailable(product_id));
        }

        CastleRepository::get_owned_in_tx(&mut tx, customer_id, castle_id)
            .await?
            .ok_or(StoreError::CastleNotFound(castle_id))?;

        let tiers = ProductRepository::list_tiers_in_tx(&mut tx, product_id).await?;
        let quote = pricing::quote(&product, quantity, &tiers, Utc::now())?;

        LedgerRepository::reserve_in_tx(&mut tx, customer_id, quote.total).await?;

        let order = OrderRepository::create_in_tx(
            &mut tx,
            &NewOrder {
                customer_id,
                product_id,
                castle_id,
                quantity,
                unit_price: quote.unit_price,
                amount: quote.total,
            },
        )
        .await?;

        tx.commit().await?;

        metrics::record_order_created(product_id);
        info!(
            order_id = order.id,
            customer_id,
            product_id,
            quantity,
            amount = order.amount,
            "Order created"
        );
        Ok(order)
    }

    /// 卖家接单
    ///
    /// 以数据库中的角色为准，会话建立后被降级的卖家不能再接单
    #[instrument(skip(self))]
    pub async fn accept_order(&self, seller_id: i64, order_id: i64) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        match UserRepository::role_in_tx(&mut tx, seller_id).await? {
            Some(Role::Seller) => {}
            Some(_) => return Err(StoreError::NotOrderParticipant(order_id)),
            None => return Err(StoreError::UserNotFound(seller_id)),
        }

        let Some(order) = OrderRepository::claim_in_tx(&mut tx, order_id, seller_id).await? else {
            // 条件更新未命中，读取当前状态给出准确的错误
            let current = OrderRepository::get_for_update_in_tx(&mut tx, order_id)
                .await?
                .ok_or(StoreError::OrderNotFound(order_id))?;
            return Err(claim_failure(&current));
        };

        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Order,
                "Order Accepted",
                format!("Your order #{} has been accepted by a seller.", order.id),
                Some(order.id),
            ),
        )
        .await?;

        tx.commit().await?;

        record_transition(OrderStatus::Pending, OrderStatus::Accepted);
        info!(order_id, seller_id, "Order accepted");
        Ok(order)
    }

    /// 卖家放弃已接的订单，订单回到待接单池
    #[instrument(skip(self))]
    pub async fn release_order(&self, seller_id: i64, order_id: i64) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        ensure_assigned_seller(&order, seller_id)?;
        ensure_transition(&order, OrderStatus::Pending)?;

        let updated = OrderRepository::unassign_in_tx(&mut tx, order_id).await?;
        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Order,
                "Order Released",
                format!(
                    "The seller released your order #{}. It is waiting for a new seller.",
                    order_id
                ),
                Some(order_id),
            ),
        )
        .await?;

        tx.commit().await?;

        record_transition(order.status, updated.status);
        info!(order_id, seller_id, "Order released");
        Ok(updated)
    }

    /// 卖家开始处理
    #[instrument(skip(self))]
    pub async fn start_order(&self, seller_id: i64, order_id: i64) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        ensure_assigned_seller(&order, seller_id)?;
        ensure_transition(&order, OrderStatus::InProgress)?;

        let updated =
            OrderRepository::set_status_in_tx(&mut tx, order_id, OrderStatus::InProgress).await?;
        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Order,
                "Order In Progress",
                format!("Work on your order #{} has started.", order_id),
                Some(order_id),
            ),
        )
        .await?;

        tx.commit().await?;

        record_transition(order.status, updated.status);
        info!(order_id, seller_id, "Order started");
        Ok(updated)
    }

    /// 卖家完成订单并结算
    ///
    /// 买家的预留积分转为支出，卖家入账，双方各写一条流水
    #[instrument(skip(self))]
    pub async fn complete_order(&self, seller_id: i64, order_id: i64) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        ensure_assigned_seller(&order, seller_id)?;
        ensure_transition(&order, OrderStatus::Completed)?;

        LedgerRepository::lock_users_in_tx(&mut tx, &[order.customer_id, seller_id]).await?;
        LedgerRepository::capture_in_tx(&mut tx, order.customer_id, order.amount).await?;
        LedgerRepository::credit_in_tx(&mut tx, seller_id, order.amount).await?;

        LedgerRepository::create_transaction_in_tx(
            &mut tx,
            &NewTransaction::settled(
                order.customer_id,
                TransactionType::Payment,
                order.amount,
                order_id,
            ),
        )
        .await?;
        LedgerRepository::create_transaction_in_tx(
            &mut tx,
            &NewTransaction::settled(seller_id, TransactionType::Earning, order.amount, order_id),
        )
        .await?;

        let updated = OrderRepository::complete_in_tx(&mut tx, order_id).await?;
        NotificationService::notify_in_tx(
            &mut tx,
            order.customer_id,
            &NewNotification::new(
                NotificationType::Order,
                "Order Completed",
                format!(
                    "Your order #{} has been completed. {} points were charged.",
                    order_id, order.amount
                ),
                Some(order_id),
            ),
        )
        .await?;

        tx.commit().await?;

        record_transition(order.status, updated.status);
        info!(order_id, seller_id, amount = order.amount, "Order completed and settled");
        Ok(updated)
    }

    /// 取消订单并释放预留积分
    ///
    /// 买家只能取消自己的 pending 订单；管理员可以取消任何未结算的进行中订单
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, actor: Actor, order_id: i64) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order = lock_order(&mut tx, order_id).await?;
        match actor.role {
            Role::Customer if order.customer_id == actor.id => {
                if order.status != OrderStatus::Pending {
                    return Err(invalid_transition(&order, OrderStatus::Cancelled));
                }
            }
            Role::Admin => {}
            _ => return Err(StoreError::OrderNotFound(order_id)),
        }
        ensure_transition(&order, OrderStatus::Cancelled)?;

        if order.status.holds_reservation(order.is_settled()) {
            LedgerRepository::release_in_tx(&mut tx, order.customer_id, order.amount).await?;
        }
        let updated =
            OrderRepository::set_status_in_tx(&mut tx, order_id, OrderStatus::Cancelled).await?;

        let notification = NewNotification::new(
            NotificationType::Order,
            "Order Cancelled",
            format!("Order #{} has been cancelled.", order_id),
            Some(order_id),
        );
        let mut recipients = vec![order.customer_id];
        recipients.extend(order.seller_id);
        for user_id in recipients.into_iter().filter(|id| *id != actor.id) {
            NotificationService::notify_in_tx(&mut tx, user_id, &notification).await?;
        }

        tx.commit().await?;

        record_transition(order.status, updated.status);
        info!(order_id, actor_id = actor.id, role = %actor.role, "Order cancelled");
        Ok(updated)
    }

    /// 按角色列出订单
    ///
    /// 买家看到自己的订单，卖家看到分配给自己的订单，管理员看到全部（可按状态筛选）
    pub async fn list_orders_for(
        &self,
        actor: Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>> {
        let filter = match actor.role {
            Role::Customer => OrderFilter::Customer(actor.id),
            Role::Seller => OrderFilter::Seller(actor.id),
            Role::Admin => OrderFilter::All(status),
        };
        let views = self.order_repo.list_views(filter, None).await?;

        Ok(views
            .into_iter()
            .filter(|v| status.is_none_or(|s| v.status == s))
            .map(|v| redact_for(actor, v))
            .collect())
    }

    /// 获取订单详情
    ///
    /// 买家只能查看自己的订单；卖家可以查看分配给自己的订单和待接单订单；
    /// 无权查看时返回 `OrderNotFound`
    pub async fn get_order_for(&self, actor: Actor, order_id: i64) -> Result<OrderView> {
        let view = self
            .order_repo
            .get_view(order_id)
            .await?
            .ok_or(StoreError::OrderNotFound(order_id))?;

        let visible = match actor.role {
            Role::Admin => true,
            Role::Customer => view.customer_id == actor.id,
            Role::Seller => {
                view.seller_id == Some(actor.id)
                    || (view.status == OrderStatus::Pending && view.seller_id.is_none())
            }
        };
        if !visible {
            return Err(StoreError::OrderNotFound(order_id));
        }

        Ok(redact_for(actor, view))
    }

    /// 待接单订单（不含登录凭证）
    pub async fn available_orders(&self, limit: Option<i64>) -> Result<Vec<OrderView>> {
        let views = self
            .order_repo
            .list_views(OrderFilter::Available, limit)
            .await?;
        Ok(views.into_iter().map(OrderView::without_credentials).collect())
    }
}

/// 锁定订单行
pub(crate) async fn lock_order(tx: &mut PgConnection, order_id: i64) -> Result<Order> {
    OrderRepository::get_for_update_in_tx(tx, order_id)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))
}

/// 校验状态流转
pub(crate) fn ensure_transition(order: &Order, to: OrderStatus) -> Result<()> {
    if order.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(invalid_transition(order, to))
    }
}

pub(crate) fn invalid_transition(order: &Order, to: OrderStatus) -> StoreError {
    StoreError::InvalidTransition {
        order_id: order.id,
        from: order.status,
        to,
    }
}

pub(crate) fn record_transition(from: OrderStatus, to: OrderStatus) {
    metrics::record_order_transition(from.as_str(), to.as_str());
}

fn ensure_assigned_seller(order: &Order, seller_id: i64) -> Result<()> {
    if order.seller_id == Some(seller_id) {
        Ok(())
    } else {
        Err(StoreError::NotOrderParticipant(order.id))
    }
}

/// 条件接单失败时的具体原因
fn claim_failure(current: &Order) -> StoreError {
    if current.seller_id.is_some() {
        StoreError::OrderAlreadyTaken(current.id)
    } else {
        invalid_transition(current, OrderStatus::Accepted)
    }
}

/// 登录凭证是否对查看者可见
///
/// 只有城堡所有者和正在处理该订单的卖家可以看到
pub fn credentials_visible(actor: Actor, view: &OrderView) -> bool {
    match actor.role {
        Role::Customer => view.customer_id == actor.id,
        Role::Seller => view.seller_id == Some(actor.id) && view.status.is_active_for_seller(),
        Role::Admin => false,
    }
}

fn redact_for(actor: Actor, view: OrderView) -> OrderView {
    if credentials_visible(actor, &view) {
        view
    } else {
        view.without_credentials()
    }
}
