//! 买家 API 处理器
//!
//! 商品浏览与报价、城堡管理、下单、申诉以及积分流水

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use store_core::dto::ProductListing;
use store_core::pricing::Quote;
use store_core::{Castle, Order, OrderView, Reclamation, ReclamationView, Transaction};
use tracing::info;
use validator::Validate;

use crate::dto::{
    ApiResponse, CastleRequest, CreateOrderRequest, OrderQuery, QuoteQuery, ReclamationRequest,
};
use crate::error::Result;
use crate::session::CurrentUser;
use crate::state::AppState;

// ═══════════════════════════════════════════════════════════════════════════
// 商品
// ═══════════════════════════════════════════════════════════════════════════

/// 上架商品列表
///
/// GET /api/customer/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductListing>>>> {
    let products = state.catalog.list_products(true).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// 商品详情
///
/// GET /api/customer/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductListing>>> {
    let product = state.catalog.get_product(id, true).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// 按数量报价
///
/// GET /api/customer/products/{id}/quote?quantity=
pub async fn quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<ApiResponse<Quote>>> {
    query.validate()?;

    let quote = state.catalog.quote(id, query.quantity).await?;
    Ok(Json(ApiResponse::success(quote)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 城堡
// ═══════════════════════════════════════════════════════════════════════════

/// 我的城堡
///
/// GET /api/customer/castles
pub async fn list_castles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Castle>>>> {
    let castles = state.castles.list_for_user(user.id).await?;
    Ok(Json(ApiResponse::success(castles)))
}

/// 添加城堡
///
/// POST /api/customer/castles
pub async fn create_castle(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CastleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Castle>>)> {
    req.validate()?;

    let castle = state.castles.create(user.id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(castle))))
}

/// 城堡详情
///
/// GET /api/customer/castles/{id}
pub async fn get_castle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Castle>>> {
    let castle = state.castles.get(user.id, id).await?;
    Ok(Json(ApiResponse::success(castle)))
}

/// 更新城堡
///
/// PUT /api/customer/castles/{id}
pub async fn update_castle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<CastleRequest>,
) -> Result<Json<ApiResponse<Castle>>> {
    req.validate()?;

    let castle = state.castles.update(user.id, id, req.into()).await?;
    Ok(Json(ApiResponse::success(castle)))
}

/// 删除城堡
///
/// DELETE /api/customer/castles/{id}
pub async fn delete_castle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.castles.delete(user.id, id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

// ═══════════════════════════════════════════════════════════════════════════
// 订单
// ═══════════════════════════════════════════════════════════════════════════

/// 我的订单
///
/// GET /api/customer/orders
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>> {
    let orders = state.orders.list_orders_for(user.actor(), query.status).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// 下单
///
/// POST /api/customer/orders
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Order>>)> {
    req.validate()?;

    let order = state
        .orders
        .create_order(user.id, req.product_id, req.castle_id, req.quantity)
        .await?;

    info!(order_id = order.id, customer_id = user.id, "Order placed via API");
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// 订单详情
///
/// GET /api/customer/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderView>>> {
    let order = state.orders.get_order_for(user.actor(), id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// 取消待接单的订单
///
/// POST /api/customer/orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = state.orders.cancel_order(user.actor(), id).await?;
    Ok(Json(ApiResponse::success(order)))
}

// ═══════════════════════════════════════════════════════════════════════════
// 申诉与流水
// ═══════════════════════════════════════════════════════════════════════════

/// 发起申诉
///
/// POST /api/customer/orders/{id}/reclamations
pub async fn file_reclamation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ReclamationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Reclamation>>)> {
    req.validate()?;

    let reclamation = state
        .reclamations
        .file(user.id, id, req.description.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reclamation))))
}

/// 我的申诉
///
/// GET /api/customer/reclamations
pub async fn list_reclamations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<ReclamationView>>>> {
    let reclamations = state.reclamations.list_for_customer(user.id).await?;
    Ok(Json(ApiResponse::success(reclamations)))
}

/// 我的积分流水
///
/// GET /api/customer/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Transaction>>>> {
    let transactions = state.ledger.list_transactions_for(user.id).await?;
    Ok(Json(ApiResponse::success(transactions)))
}
