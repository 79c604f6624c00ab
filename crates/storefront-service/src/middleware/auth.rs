//! 会话与角色中间件
//!
//! `session_middleware` 从签名 Cookie 中解析当前用户并注入请求扩展；
//! `role_gate` 按路径前缀做角色访问控制。页面路径以重定向响应，
//! `/api` 路径以 401/403 JSON 响应。

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;
use store_core::Role;

use crate::error::ApiError;
use crate::session::{CurrentUser, read_session};

/// 无需登录即可访问的路径前缀
const PUBLIC_PREFIXES: &[&str] = &["/api/auth", "/logout", "/health", "/ready", "/uploads"];

/// 登录后不应再访问的页面
const AUTH_PAGES: &[&str] = &["/login", "/register"];

/// 会话解析中间件
pub async fn session_middleware(
    jar: SignedCookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(user) = read_session(&jar) {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// 角色访问控制中间件，需位于 `session_middleware` 之后
pub async fn role_gate(request: Request<Body>, next: Next) -> Response {
    let user = request.extensions().get::<CurrentUser>().copied();
    let path = request.uri().path();

    match decide(path, user) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(to) => Redirect::to(to).into_response(),
        GateDecision::Unauthorized => {
            ApiError::Unauthorized("请先登录".to_string()).into_response()
        }
        GateDecision::Forbidden => {
            ApiError::Forbidden("当前角色无权访问".to_string()).into_response()
        }
    }
}

/// 访问控制结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
    Unauthorized,
    Forbidden,
}

/// 根据路径和当前用户决定是否放行
pub fn decide(path: &str, user: Option<CurrentUser>) -> GateDecision {
    let is_api = under(path, "/api");

    if AUTH_PAGES.iter().any(|p| under(path, p)) {
        return match user {
            Some(user) => GateDecision::Redirect(user.role.home_path()),
            None => GateDecision::Allow,
        };
    }

    if PUBLIC_PREFIXES.iter().any(|p| under(path, p)) {
        return GateDecision::Allow;
    }

    let Some(user) = user else {
        return if is_api {
            GateDecision::Unauthorized
        } else {
            GateDecision::Redirect("/login")
        };
    };

    match required_role(path) {
        Some(role) if role != user.role => {
            if is_api {
                GateDecision::Forbidden
            } else {
                GateDecision::Redirect("/")
            }
        }
        _ => GateDecision::Allow,
    }
}

/// 路径要求的角色
fn required_role(path: &str) -> Option<Role> {
    if under(path, "/admin") || under(path, "/api/admin") {
        Some(Role::Admin)
    } else if under(path, "/customer") || under(path, "/api/customer") || under(path, "/api/topup")
    {
        Some(Role::Customer)
    } else if under(path, "/seller") || under(path, "/api/seller") {
        Some(Role::Seller)
    } else {
        None
    }
}

/// 按路径段匹配前缀，`/adminx` 不属于 `/admin`
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> Option<CurrentUser> {
        Some(CurrentUser { id: 1, role })
    }

    #[test]
    fn test_anonymous_access() {
        assert_eq!(decide("/login", None), GateDecision::Allow);
        assert_eq!(decide("/register", None), GateDecision::Allow);
        assert_eq!(decide("/api/auth/login", None), GateDecision::Allow);
        assert_eq!(decide("/health", None), GateDecision::Allow);
        assert_eq!(decide("/uploads/a.png", None), GateDecision::Allow);

        assert_eq!(decide("/", None), GateDecision::Redirect("/login"));
        assert_eq!(decide("/customer", None), GateDecision::Redirect("/login"));
        assert_eq!(decide("/api/customer/orders", None), GateDecision::Unauthorized);
        assert_eq!(decide("/api/notifications", None), GateDecision::Unauthorized);
        assert_eq!(decide("/api/topup", None), GateDecision::Unauthorized);
    }

    #[test]
    fn test_logged_in_users_leave_auth_pages() {
        assert_eq!(decide("/login", user(Role::Admin)), GateDecision::Redirect("/admin"));
        assert_eq!(decide("/register", user(Role::Seller)), GateDecision::Redirect("/seller"));
        assert_eq!(decide("/login", user(Role::Customer)), GateDecision::Redirect("/customer"));
    }

    #[test]
    fn test_role_prefixes() {
        assert_eq!(decide("/admin", user(Role::Admin)), GateDecision::Allow);
        assert_eq!(decide("/admin", user(Role::Customer)), GateDecision::Redirect("/"));
        assert_eq!(decide("/seller/orders", user(Role::Customer)), GateDecision::Redirect("/"));

        assert_eq!(decide("/api/admin/users", user(Role::Seller)), GateDecision::Forbidden);
        assert_eq!(decide("/api/seller/orders/1/accept", user(Role::Customer)), GateDecision::Forbidden);
        assert_eq!(decide("/api/seller/orders/1/accept", user(Role::Seller)), GateDecision::Allow);
        assert_eq!(decide("/api/topup", user(Role::Seller)), GateDecision::Forbidden);
        assert_eq!(decide("/api/topup", user(Role::Customer)), GateDecision::Allow);
        assert_eq!(decide("/api/notifications", user(Role::Seller)), GateDecision::Allow);
    }

    #[test]
    fn test_prefix_matches_whole_segments() {
        assert!(under("/admin", "/admin"));
        assert!(under("/admin/products", "/admin"));
        assert!(!under("/administrator", "/admin"));
        assert_eq!(required_role("/sellers-guide"), None);
    }
}
