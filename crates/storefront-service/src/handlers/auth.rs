//! 认证相关的 HTTP 处理器
//!
//! 提供注册、登录、登出和获取当前用户的 API

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::SignedCookieJar;
use store_core::{StoreError, UserProfile};
use tracing::info;
use validator::Validate;

use crate::dto::{ApiResponse, LoginRequest, RegisterRequest, SessionResponse};
use crate::error::{ApiError, Result};
use crate::session::{CurrentUser, end_session, start_session};
use crate::state::AppState;

/// 注册买家账号
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    req.validate()?;

    let user = state
        .accounts
        .register(req.username.trim(), req.email.trim(), &req.password)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        UserProfile::from(user),
        "注册成功，请登录",
    )))
}

/// 用户登录
///
/// POST /api/auth/login
///
/// 成功后写入 `userId` / `userRole` 签名 Cookie
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(SignedCookieJar, Json<ApiResponse<SessionResponse>>)> {
    req.validate()?;

    let user = state.accounts.login(req.email.trim(), &req.password).await?;
    let jar = start_session(jar, &state.session, user.id, user.role);

    info!(user_id = user.id, role = %user.role, "Session started");
    Ok((
        jar,
        Json(ApiResponse::success(SessionResponse::new(user.into()))),
    ))
}

/// 登出
///
/// POST /api/auth/logout
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Json<ApiResponse<()>>) {
    (end_session(jar), Json(ApiResponse::success_empty()))
}

/// 登出页面：清除 Cookie 后跳转登录页
///
/// GET /logout
pub async fn logout_page(jar: SignedCookieJar) -> impl IntoResponse {
    (end_session(jar), Redirect::to("/login"))
}

/// 获取当前用户
///
/// GET /api/auth/me
///
/// 会话指向的用户已不存在时清除 Cookie 并返回 401
pub async fn me(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    current: CurrentUser,
) -> std::result::Result<Json<ApiResponse<UserProfile>>, (SignedCookieJar, ApiError)> {
    match state.accounts.current_user(current.id).await {
        Ok(profile) => Ok(Json(ApiResponse::success(profile))),
        Err(StoreError::UserNotFound(_)) => Err((
            end_session(jar),
            ApiError::Unauthorized("会话已失效，请重新登录".to_string()),
        )),
        Err(e) => Err((jar, e.into())),
    }
}
