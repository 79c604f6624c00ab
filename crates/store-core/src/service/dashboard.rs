//! 看板服务
//!
//! 三种角色各自的首页数据，多个只读查询并发执行。
//! 看板上的订单列表一律不含登录凭证，凭证只在订单详情中返回。

use std::sync::Arc;

use tracing::instrument;

use crate::error::{Result, StoreError};
use crate::models::OrderView;
use crate::repository::{OrderFilter, OrderRepository, StatsRepository};
use crate::service::dto::{AdminDashboard, CustomerDashboard, OrderCounts, SellerDashboard};

/// 管理员看板最近动态条数
const RECENT_ACTIVITY_LIMIT: i64 = 5;
/// 买家看板最近订单条数
const RECENT_ORDERS_LIMIT: i64 = 5;
/// 卖家看板每个列表的条数
const SELLER_LIST_LIMIT: i64 = 3;

/// 看板服务
pub struct DashboardService {
    stats_repo: Arc<StatsRepository>,
    order_repo: Arc<OrderRepository>,
}

impl DashboardService {
    pub fn new(stats_repo: Arc<StatsRepository>, order_repo: Arc<OrderRepository>) -> Self {
        Self {
            stats_repo,
            order_repo,
        }
    }

    #[instrument(skip(self))]
    pub async fn admin(&self) -> Result<AdminDashboard> {
        let (stats, recent_activity) = futures::try_join!(
            self.stats_repo.admin_stats(),
            self.stats_repo.recent_activity(RECENT_ACTIVITY_LIMIT),
        )?;

        Ok(AdminDashboard {
            stats,
            recent_activity,
        })
    }

    #[instrument(skip(self))]
    pub async fn customer(&self, customer_id: i64) -> Result<CustomerDashboard> {
        let (balance, rows, castle_count, recent_orders) = futures::try_join!(
            self.stats_repo.balance(customer_id),
            self.stats_repo.order_counts_for_customer(customer_id),
            self.stats_repo.castle_count(customer_id),
            self.order_repo.list_views(
                OrderFilter::Customer(customer_id),
                Some(RECENT_ORDERS_LIMIT)
            ),
        )?;
        let balance = balance.ok_or(StoreError::UserNotFound(customer_id))?;

        Ok(CustomerDashboard {
            available_points: balance.available(),
            balance,
            order_counts: OrderCounts::from_rows(&rows),
            castle_count,
            recent_orders: strip_credentials(recent_orders),
        })
    }

    /// 卖家看板
    ///
    /// 处理中列表只含分配给自己的订单
    #[instrument(skip(self))]
    pub async fn seller(&self, seller_id: i64) -> Result<SellerDashboard> {
        let (stats, available, active) = futures::try_join!(
            self.stats_repo.seller_stats(seller_id),
            self.order_repo
                .list_views(OrderFilter::Available, Some(SELLER_LIST_LIMIT)),
            self.order_repo
                .list_active_for_seller(seller_id, SELLER_LIST_LIMIT),
        )?;
        let stats = stats.ok_or(StoreError::UserNotFound(seller_id))?;

        Ok(SellerDashboard {
            stats,
            latest_available: strip_credentials(available),
            latest_active: strip_credentials(active),
        })
    }
}

fn strip_credentials(views: Vec<OrderView>) -> Vec<OrderView> {
    views.into_iter().map(OrderView::without_credentials).collect()
}
