//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射，并组装完整的应用

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use store_shared::config::AppConfig;
use store_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::middleware::{role_gate, session_middleware};
use crate::{handlers, state::AppState};

/// multipart 边界和文本字段的额外空间
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// 构建认证相关的路由（公开路由）
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// 构建买家路由
///
/// 包含商品浏览、城堡管理、订单、申诉和积分流水
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customer/dashboard", get(handlers::dashboard::customer))
        // 商品
        .route("/customer/products", get(handlers::customer::list_products))
        .route(
            "/customer/products/{id}",
            get(handlers::customer::get_product),
        )
        .route(
            "/customer/products/{id}/quote",
            get(handlers::customer::quote),
        )
        // 城堡
        .route(
            "/customer/castles",
            get(handlers::customer::list_castles).post(handlers::customer::create_castle),
        )
        .route(
            "/customer/castles/{id}",
            get(handlers::customer::get_castle)
                .put(handlers::customer::update_castle)
                .delete(handlers::customer::delete_castle),
        )
        // 订单
        .route(
            "/customer/orders",
            get(handlers::customer::list_orders).post(handlers::customer::create_order),
        )
        .route("/customer/orders/{id}", get(handlers::customer::get_order))
        .route(
            "/customer/orders/{id}/cancel",
            post(handlers::customer::cancel_order),
        )
        .route(
            "/customer/orders/{id}/reclamations",
            post(handlers::customer::file_reclamation),
        )
        .route(
            "/customer/reclamations",
            get(handlers::customer::list_reclamations),
        )
        .route(
            "/customer/transactions",
            get(handlers::customer::list_transactions),
        )
}

/// 构建充值路由
///
/// 凭证上传需要放宽请求体大小限制
fn topup_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/topup",
        post(handlers::topup::submit_topup).layer(DefaultBodyLimit::max(
            max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        )),
    )
}

/// 构建卖家路由
fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/seller/dashboard", get(handlers::dashboard::seller))
        .route(
            "/seller/orders/available",
            get(handlers::seller::available_orders),
        )
        .route("/seller/orders", get(handlers::seller::list_orders))
        .route("/seller/orders/{id}", get(handlers::seller::get_order))
        .route(
            "/seller/orders/{id}/accept",
            post(handlers::seller::accept_order),
        )
        .route(
            "/seller/orders/{id}/release",
            post(handlers::seller::release_order),
        )
        .route(
            "/seller/orders/{id}/start",
            post(handlers::seller::start_order),
        )
        .route(
            "/seller/orders/{id}/complete",
            post(handlers::seller::complete_order),
        )
        .route(
            "/seller/payouts",
            get(handlers::seller::list_payouts).post(handlers::seller::request_payout),
        )
}

/// 构建管理员路由
///
/// 包含商品、用户、订单、充值/提现审核和申诉处理
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(handlers::dashboard::admin))
        // 商品管理
        .route(
            "/admin/products",
            get(handlers::admin::list_products).post(handlers::admin::create_product),
        )
        .route(
            "/admin/products/{id}",
            get(handlers::admin::get_product).put(handlers::admin::update_product),
        )
        .route(
            "/admin/products/{id}/tiers",
            put(handlers::admin::replace_tiers),
        )
        .route(
            "/admin/products/{id}/activate",
            post(handlers::admin::activate_product),
        )
        .route(
            "/admin/products/{id}/deactivate",
            post(handlers::admin::deactivate_product),
        )
        // 用户
        .route("/admin/users", get(handlers::admin::list_users))
        .route("/admin/users/{id}/role", put(handlers::admin::change_role))
        // 订单
        .route("/admin/orders", get(handlers::admin::list_orders))
        .route(
            "/admin/orders/{id}/cancel",
            post(handlers::admin::cancel_order),
        )
        // 充值与提现
        .route("/admin/transactions", get(handlers::admin::list_transactions))
        .route(
            "/admin/transactions/{id}",
            get(handlers::admin::get_transaction),
        )
        .route(
            "/admin/topups/{id}/approve",
            post(handlers::admin::approve_topup),
        )
        .route(
            "/admin/topups/{id}/reject",
            post(handlers::admin::reject_topup),
        )
        .route(
            "/admin/payouts/{id}/approve",
            post(handlers::admin::approve_payout),
        )
        .route(
            "/admin/payouts/{id}/reject",
            post(handlers::admin::reject_payout),
        )
        // 申诉
        .route(
            "/admin/reclamations",
            get(handlers::admin::list_reclamations),
        )
        .route(
            "/admin/reclamations/{id}/resolve",
            post(handlers::admin::resolve_reclamation),
        )
        .route(
            "/admin/reclamations/{id}/reject",
            post(handlers::admin::reject_reclamation),
        )
}

/// 构建通知路由（所有登录用户）
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            post(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_read),
        )
}

/// 构建页面路由
///
/// 首页跳转、登出跳转和三个角色工作台
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard::home))
        .route("/logout", get(handlers::auth::logout_page))
        .route("/admin", get(handlers::dashboard::admin))
        .route("/customer", get(handlers::dashboard::customer))
        .route("/seller", get(handlers::dashboard::seller))
}

/// 构建完整的 API 路由（不含 `/api` 前缀）
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(customer_routes())
        .merge(topup_routes(max_upload_bytes))
        .merge(seller_routes())
        .merge(admin_routes())
        .merge(notification_routes())
}

/// 组装完整应用：路由、静态凭证目录、会话与角色中间件、可观测性中间件
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let uploads_prefix = config.uploads.public_prefix.trim_end_matches('/');

    Router::new()
        .nest("/api", api_routes(state.max_upload_bytes))
        .merge(page_routes())
        .nest_service(uploads_prefix, ServeDir::new(&config.uploads.dir))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // 角色访问控制依赖会话中间件注入的 CurrentUser，需在其内层
        .layer(middleware::from_fn(role_gate))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(config))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}

/// CORS 配置：`server.cors_origins` 为逗号分隔的来源列表或 `*`
///
/// 会话依赖 Cookie，指定来源时允许携带凭证
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allowed_origins = config.server.cors_origins.trim();

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" is unsafe in production, set explicit origins");
        }
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    }
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    response
}
