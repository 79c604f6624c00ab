//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::PgPool;
use store_core::repository::{
    CastleRepository, LedgerRepository, NotificationRepository, OrderRepository,
    ProductRepository, ReclamationRepository, StatsRepository, UserRepository,
};
use store_core::service::{
    AccountService, CastleService, CatalogService, DashboardService, LedgerService,
    NotificationService, OrderService, ReclamationService,
};
use store_shared::config::AppConfig;

use crate::session::SessionSettings;
use crate::uploads::{LocalReceiptStore, ReceiptStore};

/// Axum 应用共享状态
///
/// 服务实例通过 Arc 在 handler 间共享
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub castles: Arc<CastleService>,
    pub orders: Arc<OrderService>,
    pub ledger: Arc<LedgerService>,
    pub reclamations: Arc<ReclamationService>,
    pub notifications: Arc<NotificationService>,
    pub dashboards: Arc<DashboardService>,
    /// 充值凭证存储
    pub receipts: Arc<dyn ReceiptStore>,
    pub session: SessionSettings,
    /// 凭证文件大小上限（字节）
    pub max_upload_bytes: usize,
}

impl AppState {
    /// 按配置组装全部服务
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        let order_repo = Arc::new(OrderRepository::new(pool.clone()));
        let notifications = Arc::new(NotificationService::new(Arc::new(
            NotificationRepository::new(pool.clone()),
        )));

        Self {
            accounts: Arc::new(AccountService::new(
                Arc::new(UserRepository::new(pool.clone())),
                notifications.clone(),
            )),
            catalog: Arc::new(CatalogService::new(Arc::new(ProductRepository::new(
                pool.clone(),
            )))),
            castles: Arc::new(CastleService::new(
                Arc::new(CastleRepository::new(pool.clone())),
                pool.clone(),
            )),
            orders: Arc::new(OrderService::new(order_repo.clone(), pool.clone())),
            ledger: Arc::new(LedgerService::new(
                Arc::new(LedgerRepository::new(pool.clone())),
                pool.clone(),
            )),
            reclamations: Arc::new(ReclamationService::new(
                Arc::new(ReclamationRepository::new(pool.clone())),
                pool.clone(),
            )),
            dashboards: Arc::new(DashboardService::new(
                Arc::new(StatsRepository::new(pool.clone())),
                order_repo,
            )),
            notifications,
            receipts: Arc::new(LocalReceiptStore::new(&config.uploads)),
            session: SessionSettings::from_config(&config.session),
            max_upload_bytes: config.uploads.max_bytes,
            pool,
        }
    }

    /// 替换凭证存储
    pub fn with_receipt_store(mut self, receipts: Arc<dyn ReceiptStore>) -> Self {
        self.receipts = receipts;
        self
    }
}

/// `SignedCookieJar` 提取器从状态中取签名密钥
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session.key.clone()
    }
}
