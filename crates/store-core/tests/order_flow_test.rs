//! 订单与积分流转集成测试
//!
//! 使用真实 PostgreSQL 验证预留、结算、退款和充值审核的积分守恒。
//!
//! ## 运行方式
//!
//! ```bash
//! TEST_DATABASE_URL=postgres://... cargo test -p store-core --test order_flow_test -- --ignored
//! ```

use std::sync::Arc;

use fake::Fake;
use fake::faker::internet::en::{Password, SafeEmail};
use fake::faker::lorem::en::Word;
use sqlx::PgPool;
use store_core::models::{
    Actor, Balance, CastleInput, NewProduct, OrderStatus, ReclamationStatus, Role, TierInput,
    TransactionStatus,
};
use store_core::repository::{
    CastleRepository, LedgerRepository, OrderRepository, ProductRepository, ReclamationRepository,
};
use store_core::service::{
    CastleService, CatalogService, LedgerService, OrderService, ReclamationService, TopUpRequest,
};
use store_core::StoreError;
use store_shared::database::Database;
use store_shared::test_utils::{test_database_config, test_email, test_username};

// ==================== 辅助函数 ====================

async fn setup_pool() -> PgPool {
    let db = Database::connect(&test_database_config())
        .await
        .expect("数据库连接失败");
    db.run_migrations().await.expect("迁移失败");
    db.pool().clone()
}

/// 直接插入指定角色和积分的用户
async fn seed_user(pool: &PgPool, role: Role, points: i64) -> i64 {
    let prefix = role.as_str();
    sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, password_hash, role, points)
        VALUES ($1, $2, 'not-a-real-hash', $3, $4)
        RETURNING id
        "#,
    )
    .bind(test_username(prefix))
    .bind(test_email(prefix))
    .bind(role)
    .bind(points)
    .fetch_one(pool)
    .await
    .expect("插入测试用户失败")
}

async fn balance_of(pool: &PgPool, user_id: i64) -> Balance {
    sqlx::query_as::<_, Balance>("SELECT points, reserved_points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("查询余额失败")
}

/// 单价 100，购买 5 件及以上单价 80
async fn seed_product(pool: &PgPool) -> i64 {
    let catalog = CatalogService::new(Arc::new(ProductRepository::new(pool.clone())));
    let listing = catalog
        .create_product(NewProduct {
            name: "Rally Hosting".to_string(),
            price: 100,
            active: true,
            tiers: vec![TierInput {
                min_quantity: 5,
                max_quantity: None,
                price: 80,
            }],
            ..Default::default()
        })
        .await
        .expect("创建商品失败");
    listing.product.id
}

async fn seed_castle(pool: &PgPool, user_id: i64) -> i64 {
    castle_service(pool)
        .create(
            user_id,
            CastleInput {
                name: Word().fake(),
                igg_id: (100_000_000u64..999_999_999).fake::<u64>().to_string(),
                castle_id: format!("K{}", (1u32..999).fake::<u32>()),
                login_credentials: format!(
                    "{} / {}",
                    SafeEmail().fake::<String>(),
                    Password(8..16).fake::<String>()
                ),
            },
        )
        .await
        .expect("创建城堡失败")
        .id
}

fn castle_service(pool: &PgPool) -> CastleService {
    CastleService::new(Arc::new(CastleRepository::new(pool.clone())), pool.clone())
}

fn reclamation_service(pool: &PgPool) -> ReclamationService {
    ReclamationService::new(
        Arc::new(ReclamationRepository::new(pool.clone())),
        pool.clone(),
    )
}

fn ledger_service(pool: &PgPool) -> LedgerService {
    LedgerService::new(Arc::new(LedgerRepository::new(pool.clone())), pool.clone())
}

fn order_service(pool: &PgPool) -> OrderService {
    OrderService::new(Arc::new(OrderRepository::new(pool.clone())), pool.clone())
}

/// 买家、卖家、商品、城堡齐备的下单场景
struct Scenario {
    pool: PgPool,
    orders: OrderService,
    customer: i64,
    seller: i64,
    product: i64,
    castle: i64,
}

async fn scenario(customer_points: i64) -> Scenario {
    let pool = setup_pool().await;
    let customer = seed_user(&pool, Role::Customer, customer_points).await;
    let seller = seed_user(&pool, Role::Seller, 0).await;
    let product = seed_product(&pool).await;
    let castle = seed_castle(&pool, customer).await;
    Scenario {
        orders: order_service(&pool),
        pool,
        customer,
        seller,
        product,
        castle,
    }
}

// ==================== 下单与预留 ====================

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_create_order_reserves_points() {
    let s = scenario(1000).await;

    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 5)
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.unit_price, 80);
    assert_eq!(order.amount, 400);

    let balance = balance_of(&s.pool, s.customer).await;
    assert_eq!(balance.points, 1000);
    assert_eq!(balance.reserved_points, 400);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_create_order_insufficient_points() {
    let s = scenario(150).await;

    let err = s
        .orders
        .create_order(s.customer, s.product, s.castle, 2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::InsufficientPoints {
            required: 200,
            available: 150
        }
    ));
    assert_eq!(balance_of(&s.pool, s.customer).await.reserved_points, 0);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_create_order_with_foreign_castle() {
    let s = scenario(1000).await;
    let stranger = seed_user(&s.pool, Role::Customer, 0).await;
    let foreign_castle = seed_castle(&s.pool, stranger).await;

    let err = s
        .orders
        .create_order(s.customer, s.product, foreign_castle, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::CastleNotFound(_)));
}

// ==================== 接单与结算 ====================

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_concurrent_accept_has_single_winner() {
    let s = scenario(1000).await;
    let rival = seed_user(&s.pool, Role::Seller, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();

    let first = order_service(&s.pool);
    let second = order_service(&s.pool);
    let (a, b) = tokio::join!(
        first.accept_order(s.seller, order.id),
        second.accept_order(rival, order.id)
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(StoreError::OrderAlreadyTaken(_))));
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_accept_uses_current_role() {
    let s = scenario(1000).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();

    // 买家即使持有卖家会话也不能接单
    let err = s.orders.accept_order(s.customer, order.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOrderParticipant(_)));

    sqlx::query("UPDATE users SET role = 'customer' WHERE id = $1")
        .bind(s.seller)
        .execute(&s.pool)
        .await
        .unwrap();
    let err = s.orders.accept_order(s.seller, order.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOrderParticipant(_)));

    let view = s
        .orders
        .get_order_for(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap();
    assert_eq!(view.status, OrderStatus::Pending);
    assert_eq!(view.seller_id, None);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_release_only_before_work_starts() {
    let s = scenario(1000).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();

    s.orders.accept_order(s.seller, order.id).await.unwrap();
    let released = s.orders.release_order(s.seller, order.id).await.unwrap();
    assert_eq!(released.status, OrderStatus::Pending);
    assert_eq!(released.seller_id, None);
    assert_eq!(balance_of(&s.pool, s.customer).await.reserved_points, 100);

    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.start_order(s.seller, order.id).await.unwrap();
    let err = s.orders.release_order(s.seller, order.id).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: OrderStatus::InProgress,
            to: OrderStatus::Pending,
            ..
        }
    ));
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_customer_cannot_cancel_accepted_order() {
    let s = scenario(1000).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 2)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();

    let err = s
        .orders
        .cancel_order(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: OrderStatus::Accepted,
            to: OrderStatus::Cancelled,
            ..
        }
    ));
    assert_eq!(balance_of(&s.pool, s.customer).await.reserved_points, 200);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_complete_settles_points() {
    let s = scenario(1000).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 3)
        .await
        .unwrap();

    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.start_order(s.seller, order.id).await.unwrap();
    let completed = s.orders.complete_order(s.seller, order.id).await.unwrap();

    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.settled_at.is_some());

    let customer = balance_of(&s.pool, s.customer).await;
    assert_eq!(customer.points, 700);
    assert_eq!(customer.reserved_points, 0);
    assert_eq!(balance_of(&s.pool, s.seller).await.points, 300);

    let ledger = LedgerRepository::new(s.pool.clone());
    let payments = ledger.list_by_user(s.customer).await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].order_id, Some(order.id));
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_only_assigned_seller_can_complete() {
    let s = scenario(1000).await;
    let other = seed_user(&s.pool, Role::Seller, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();

    let err = s.orders.complete_order(other, order.id).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOrderParticipant(_)));
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_cancel_releases_reservation() {
    let s = scenario(500).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 2)
        .await
        .unwrap();

    let cancelled = s
        .orders
        .cancel_order(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let balance = balance_of(&s.pool, s.customer).await;
    assert_eq!(balance.points, 500);
    assert_eq!(balance.reserved_points, 0);
}

// ==================== 城堡删除 ====================

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_castle_in_use_blocks_delete() {
    let s = scenario(1000).await;
    let castles = castle_service(&s.pool);
    s.orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();

    let err = castles.delete(s.customer, s.castle).await.unwrap_err();
    assert!(matches!(err, StoreError::CastleInUse(_)));
    assert!(castles.get(s.customer, s.castle).await.is_ok());
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_castle_with_history_is_archived() {
    let s = scenario(1000).await;
    let castles = castle_service(&s.pool);
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.complete_order(s.seller, order.id).await.unwrap();

    castles.delete(s.customer, s.castle).await.unwrap();

    let err = castles.get(s.customer, s.castle).await.unwrap_err();
    assert!(matches!(err, StoreError::CastleNotFound(_)));
    let archived: bool = sqlx::query_scalar("SELECT archived FROM castles WHERE id = $1")
        .bind(s.castle)
        .fetch_one(&s.pool)
        .await
        .unwrap();
    assert!(archived);

    // 历史订单仍然可以查看
    let view = s
        .orders
        .get_order_for(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap();
    assert_eq!(view.castle_id, s.castle);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_unused_castle_is_removed() {
    let s = scenario(0).await;
    let castles = castle_service(&s.pool);

    castles.delete(s.customer, s.castle).await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM castles WHERE id = $1")
        .bind(s.castle)
        .fetch_one(&s.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

// ==================== 申诉退款 ====================

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_refund_after_settlement_moves_points_back() {
    let s = scenario(1000).await;
    let admin = seed_user(&s.pool, Role::Admin, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 2)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.complete_order(s.seller, order.id).await.unwrap();

    let reclamations = reclamation_service(&s.pool);
    let filed = reclamations
        .file(s.customer, order.id, "Troops were never delivered")
        .await
        .unwrap();

    // 同一订单不能重复申诉
    let dup = reclamations
        .file(s.customer, order.id, "again")
        .await
        .unwrap_err();
    assert!(matches!(dup, StoreError::ReclamationExists(_)));

    reclamations
        .resolve(admin, filed.id, Some("Confirmed with seller".to_string()))
        .await
        .unwrap();

    assert_eq!(balance_of(&s.pool, s.customer).await.points, 1000);
    assert_eq!(balance_of(&s.pool, s.seller).await.points, 0);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_rejected_reclamation_restores_status() {
    let s = scenario(1000).await;
    let admin = seed_user(&s.pool, Role::Admin, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.start_order(s.seller, order.id).await.unwrap();

    let reclamations = reclamation_service(&s.pool);
    let filed = reclamations
        .file(s.customer, order.id, "Slow progress")
        .await
        .unwrap();

    // 申诉期间卖家不能完成订单
    let err = s.orders.complete_order(s.seller, order.id).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidTransition { .. }));

    reclamations.reject(admin, filed.id, None).await.unwrap();

    let view = s
        .orders
        .get_order_for(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap();
    assert_eq!(view.status, OrderStatus::InProgress);
    assert_eq!(balance_of(&s.pool, s.customer).await.reserved_points, 100);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_second_reclamation_on_same_order() {
    let s = scenario(1000).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 1)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();

    let reclamations = reclamation_service(&s.pool);
    reclamations
        .file(s.customer, order.id, "Seller stopped responding")
        .await
        .unwrap();

    let err = reclamations
        .file(s.customer, order.id, "Still no response")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ReclamationExists(id) if id == order.id));
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_refund_before_settlement_releases_reservation() {
    let s = scenario(1000).await;
    let admin = seed_user(&s.pool, Role::Admin, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 3)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.start_order(s.seller, order.id).await.unwrap();

    let reclamations = reclamation_service(&s.pool);
    let filed = reclamations
        .file(s.customer, order.id, "Wrong castle boosted")
        .await
        .unwrap();
    reclamations.resolve(admin, filed.id, None).await.unwrap();

    let customer = balance_of(&s.pool, s.customer).await;
    assert_eq!(customer.points, 1000);
    assert_eq!(customer.reserved_points, 0);
    assert_eq!(balance_of(&s.pool, s.seller).await.points, 0);

    // 未结算的订单退款不产生流水
    let ledger = LedgerRepository::new(s.pool.clone());
    assert!(ledger.list_by_user(s.customer).await.unwrap().is_empty());

    let view = s
        .orders
        .get_order_for(Actor::new(s.customer, Role::Customer), order.id)
        .await
        .unwrap();
    assert_eq!(view.status, OrderStatus::Refunded);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_refund_fails_when_seller_points_are_reserved() {
    let s = scenario(1000).await;
    let admin = seed_user(&s.pool, Role::Admin, 0).await;
    let order = s
        .orders
        .create_order(s.customer, s.product, s.castle, 2)
        .await
        .unwrap();
    s.orders.accept_order(s.seller, order.id).await.unwrap();
    s.orders.complete_order(s.seller, order.id).await.unwrap();

    // 卖家把收入全部申请提现，可用积分为 0
    ledger_service(&s.pool)
        .request_payout(s.seller, 200, "paypal".to_string(), None)
        .await
        .unwrap();

    let reclamations = reclamation_service(&s.pool);
    let filed = reclamations
        .file(s.customer, order.id, "Service not delivered")
        .await
        .unwrap();
    let err = reclamations.resolve(admin, filed.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientPoints {
            required: 200,
            available: 0
        }
    ));

    let customer = balance_of(&s.pool, s.customer).await;
    assert_eq!(customer.points, 800);
    let seller = balance_of(&s.pool, s.seller).await;
    assert_eq!(seller.points, 200);
    assert_eq!(seller.reserved_points, 200);

    let pending = reclamations
        .list(Some(ReclamationStatus::Pending))
        .await
        .unwrap();
    assert!(pending.iter().any(|r| r.id == filed.id));
}

// ==================== 充值与提现 ====================

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_topup_approval_credits_once() {
    let pool = setup_pool().await;
    let customer = seed_user(&pool, Role::Customer, 0).await;
    let admin = seed_user(&pool, Role::Admin, 0).await;
    let ledger = ledger_service(&pool);

    let txn = ledger
        .submit_topup(TopUpRequest {
            customer_id: customer,
            amount: 250,
            payment_method: "bank_transfer".to_string(),
            receipt_url: "/uploads/receipts/test.png".to_string(),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(balance_of(&pool, customer).await.points, 0);

    ledger.approve_topup(admin, txn.id).await.unwrap();
    assert_eq!(balance_of(&pool, customer).await.points, 250);

    let again = ledger.approve_topup(admin, txn.id).await.unwrap_err();
    assert!(matches!(again, StoreError::TransactionNotPending(_)));
    assert_eq!(balance_of(&pool, customer).await.points, 250);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_payout_reject_releases_reservation() {
    let pool = setup_pool().await;
    let seller = seed_user(&pool, Role::Seller, 600).await;
    let admin = seed_user(&pool, Role::Admin, 0).await;
    let ledger = ledger_service(&pool);

    let txn = ledger
        .request_payout(seller, 400, "paypal".to_string(), None)
        .await
        .unwrap();
    assert_eq!(balance_of(&pool, seller).await.reserved_points, 400);

    let err = ledger
        .request_payout(seller, 300, "paypal".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InsufficientPoints { .. }));

    ledger
        .reject_payout(admin, txn.id, Some("Invalid account".to_string()))
        .await
        .unwrap();
    let balance = balance_of(&pool, seller).await;
    assert_eq!(balance.points, 600);
    assert_eq!(balance.reserved_points, 0);
}

#[tokio::test]
#[ignore = "需要数据库"]
async fn test_payout_approval_captures_reservation() {
    let pool = setup_pool().await;
    let seller = seed_user(&pool, Role::Seller, 600).await;
    let admin = seed_user(&pool, Role::Admin, 0).await;
    let ledger = ledger_service(&pool);

    let txn = ledger
        .request_payout(seller, 250, "bank_transfer".to_string(), None)
        .await
        .unwrap();

    let approved = ledger
        .approve_payout(admin, txn.id, Some("/uploads/receipts/wire.pdf".to_string()))
        .await
        .unwrap();
    assert_eq!(approved.status, TransactionStatus::Completed);
    assert_eq!(approved.reviewed_by, Some(admin));

    let balance = balance_of(&pool, seller).await;
    assert_eq!(balance.points, 350);
    assert_eq!(balance.reserved_points, 0);

    let again = ledger.approve_payout(admin, txn.id, None).await.unwrap_err();
    assert!(matches!(again, StoreError::TransactionNotPending(_)));
    assert_eq!(balance_of(&pool, seller).await.points, 350);
}
