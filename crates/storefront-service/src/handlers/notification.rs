//! 站内通知 API 处理器
//!
//! 所有登录用户共用，只能访问自己的通知

use axum::{
    Json,
    extract::{Path, Query, State},
};
use store_core::Notification;

use crate::dto::{ApiResponse, CountResponse, NotificationQuery};
use crate::error::Result;
use crate::session::CurrentUser;
use crate::state::AppState;

/// 通知列表
///
/// GET /api/notifications?unreadOnly=true
pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = state
        .notifications
        .list_for(user.id, query.unread_only)
        .await?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<CountResponse>>> {
    let count = state.notifications.unread_count(user.id).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.notifications.mark_read(user.id, id).await?;
    Ok(Json(ApiResponse::success_empty()))
}

/// 全部标记已读，返回更新条数
///
/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<CountResponse>>> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    Ok(Json(ApiResponse::success(CountResponse {
        count: updated as i64,
    })))
}
