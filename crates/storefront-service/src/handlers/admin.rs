//! 管理员 API 处理器
//!
//! 商品与阶梯价格管理、用户角色、订单干预、充值/提现审核和申诉处理

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use store_core::dto::ProductListing;
use store_core::{
    NewProduct, Order, OrderView, PriceTier, ProductPatch, Reclamation, ReclamationView,
    TierInput, Transaction, UserProfile,
};
use tracing::info;
use validator::Validate;

use crate::dto::{
    ApiResponse, ApprovePayoutRequest, ChangeRoleRequest, OrderQuery, ReclamationQuery,
    ReviewRequest, TransactionQuery, UserQuery,
};
use crate::error::Result;
use crate::session::CurrentUser;
use crate::state::AppState;

// ═══════════════════════════════════════════════════════════════════════════
// 商品管理
// ═══════════════════════════════════════════════════════════════════════════

/// 全部商品（含已下架）
///
/// GET /api/admin/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductListing>>>> {
    let products = state.catalog.list_products(false).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// GET /api/admin/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductListing>>> {
    let product = state.catalog.get_product(id, false).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 创建商品，可同时提交阶梯价格
///
/// POST /api/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<ProductListing>>)> {
    let product = state.catalog.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// 部分更新商品
///
/// PUT /api/admin/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ProductPatch>,
) -> Result<Json<ApiResponse<ProductListing>>> {
    let product = state.catalog.update_product(id, req).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 整体替换阶梯价格
///
/// PUT /api/admin/products/{id}/tiers
pub async fn replace_tiers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(tiers): Json<Vec<TierInput>>,
) -> Result<Json<ApiResponse<Vec<PriceTier>>>> {
    let tiers = state.catalog.replace_tiers(id, tiers).await?;
    Ok(Json(ApiResponse::success(tiers)))
}

/// POST /api/admin/products/{id}/activate
pub async fn activate_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductListing>>> {
    let product = state.catalog.set_active(id, true).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// POST /api/admin/products/{id}/deactivate
pub async fn deactivate_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductListing>>> {
    let product = state.catalog.set_active(id, false).await?;
    Ok(Json(ApiResponse::success(product)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 用户
// ═══════════════════════════════════════════════════════════════════════════

/// 用户列表，可按角色筛选
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>> {
    let users = state.accounts.list_users(query.role).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// 修改用户角色，下次登录生效
///
/// PUT /api/admin/users/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let user = state.accounts.change_role(admin.id, id, req.role).await?;

    info!(admin_id = admin.id, user_id = id, role = %req.role, "User role changed via API");
    Ok(Json(ApiResponse::success(user)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 订单
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/admin/orders
pub async fn list_orders(
    State(state): State<AppState>,
    admin: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = state.orders.list_orders_for(admin.actor(), query.status).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 强制取消订单并释放预留积分
///
/// POST /api/admin/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.cancel_order(admin.actor(), id).await?;
    Ok(Json(ApiResponse::success(order)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 充值与提现审核
// ═══════════════════════════════════════════════════════════════════════════

/// 交易流水，可按类型和状态筛选
///
/// GET /api/admin/transactions?type=top_up&status=pending
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>> {
    let transactions = state
        .ledger
        .list_transactions(query.kind, query.status)
        .await?;
    Ok(Json(ApiResponse::success(transactions)))
}

/// GET /api/admin/transactions/{id}
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Transaction>>> {
    let transaction = state.ledger.get_transaction(id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// 充值审核通过并入账
///
/// POST /api/admin/topups/{id}/approve
pub async fn approve_topup(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Transaction>>> {
    let transaction = state.ledger.approve_topup(admin.id, id).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// POST /api/admin/topups/{id}/reject
pub async fn reject_topup(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ApiResponse<Transaction>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let transaction = state.ledger.reject_topup(admin.id, id, req.notes).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// 提现审核通过，扣除预留积分
///
/// POST /api/admin/payouts/{id}/approve
pub async fn approve_payout(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<ApprovePayoutRequest>>,
) -> Result<Json<ApiResponse<Transaction>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let transaction = state
        .ledger
        .approve_payout(admin.id, id, req.receipt_url)
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}

/// 驳回提现，释放预留积分
///
/// POST /api/admin/payouts/{id}/reject
pub async fn reject_payout(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ApiResponse<Transaction>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let transaction = state.ledger.reject_payout(admin.id, id, req.notes).await?;
    Ok(Json(ApiResponse::success(transaction)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 申诉
// ═══════════════════════════════════════════════════════════════════════════

/// GET /api/admin/reclamations
pub async fn list_reclamations(
    State(state): State<AppState>,
    Query(query): Query<ReclamationQuery>,
) -> Result<Json<ApiResponse<Vec<ReclamationView>>>> {
    let reclamations = state.reclamations.list(query.status).await?;
    Ok(Json(ApiResponse::success(reclamations)))
}

/// 申诉成立，订单退款
///
/// POST /api/admin/reclamations/{id}/resolve
pub async fn resolve_reclamation(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ApiResponse<Reclamation>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let reclamation = state.reclamations.resolve(admin.id, id, req.notes).await?;
    Ok(Json(ApiResponse::success(reclamation)))
}

/// 驳回申诉，订单恢复原状态
///
/// POST /api/admin/reclamations/{id}/reject
pub async fn reject_reclamation(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ApiResponse<Reclamation>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    req.validate()?;

    let reclamation = state.reclamations.reject(admin.id, id, req.notes).await?;
    Ok(Json(ApiResponse::success(reclamation)))
}
