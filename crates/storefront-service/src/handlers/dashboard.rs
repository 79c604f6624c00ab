//! 首页与角色工作台
//!
//! `/` 按登录角色跳转；`/admin`、`/customer`、`/seller` 及对应的
//! `/api/{role}/dashboard` 返回工作台数据

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use store_core::dto::{AdminDashboard, CustomerDashboard, SellerDashboard};

use crate::dto::ApiResponse;
use crate::error::Result;
use crate::session::CurrentUser;
use crate::state::AppState;

/// 首页：已登录跳转角色首页，否则跳转登录页
///
/// GET /
pub async fn home(user: Option<CurrentUser>) -> impl IntoResponse {
    match user {
        Some(user) => Redirect::to(user.role.home_path()),
        None => Redirect::to("/login"),
    }
}

/// 管理员工作台
///
/// GET /admin, GET /api/admin/dashboard
pub async fn admin(State(state): State<AppState>) -> Result<Json<ApiResponse<AdminDashboard>>> {
    let dashboard = state.dashboards.admin().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// 买家工作台
///
/// GET /customer, GET /api/customer/dashboard
pub async fn customer(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<CustomerDashboard>>> {
    let dashboard = state.dashboards.customer(user.id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// 卖家工作台
///
/// GET /seller, GET /api/seller/dashboard
pub async fn seller(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<SellerDashboard>>> {
    let dashboard = state.dashboards.seller(user.id).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}
