//! 卖家 API 处理器
//!
//! 接单、推进订单状态和提现申请

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use store_core::{Order, OrderView, Transaction, TransactionType};
use validator::Validate;

use crate::dto::{ApiResponse, AvailableQuery, OrderQuery, PayoutRequest};
use crate::error::Result;
use crate::session::CurrentUser;
use crate::state::AppState;

/// 待接单列表上限
const MAX_AVAILABLE_LIMIT: i64 = 100;

/// 待接单订单（不含登录凭证）
///
/// GET /api/seller/orders/available
pub async fn available_orders(
    State(state): State<AppState>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>> {
    let limit = query.limit.map(|l| l.clamp(1, MAX_AVAILABLE_LIMIT));
    let orders = state.orders.available_orders(limit).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 分配给我的订单
///
/// GET /api/seller/orders
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = state.orders.list_orders_for(user.actor(), query.status).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 订单详情，接单后可看到登录凭证
///
/// GET /api/seller/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let order = state.orders.get_order_for(user.actor(), id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 接单
///
/// POST /api/seller/orders/{id}/accept
pub async fn accept_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.accept_order(user.id, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 放弃已接订单
///
/// POST /api/seller/orders/{id}/release
pub async fn release_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.release_order(user.id, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/seller/orders/{id}/start
pub async fn start_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.start_order(user.id, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 完成订单并结算积分
///
/// POST /api/seller/orders/{id}/complete
pub async fn complete_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.complete_order(user.id, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 我的提现记录
///
/// GET /api/seller/payouts
pub async fn list_payouts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>> {
    let payouts = state
        .ledger
        .list_transactions_for(user.id)
        .await?
        .into_iter()
        .filter(|t| t.kind == TransactionType::Payout)
        .collect();
    Ok(Json(ApiResponse::success(payouts)))
}

/// 申请提现
///
/// POST /api/seller/payouts
pub async fn request_payout(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<PayoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>)> {
    req.validate()?;

    let payout = state
        .ledger
        .request_payout(user.id, req.amount, req.payment_method, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payout))))
}
