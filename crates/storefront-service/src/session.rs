//! 会话 Cookie
//!
//! 登录后写入 `userId` 与 `userRole` 两个签名 Cookie。`userRole` 的值为
//! `{id}:{role}`，与 `userId` 绑定；签名校验失败、只有其中一个 Cookie，或两者
//! 的用户 ID 不一致时视为未登录。

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use store_core::{Actor, Role};
use store_shared::config::SessionConfig;

use crate::error::ApiError;

pub const USER_ID_COOKIE: &str = "userId";
pub const USER_ROLE_COOKIE: &str = "userRole";

/// 会话签名与 Cookie 属性
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub max_age_days: i64,
    pub secure: bool,
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            key: derive_key(&config.secret),
            max_age_days: config.max_age_days,
            secure: config.secure,
        }
    }
}

/// 由配置的密钥派生 Cookie 签名密钥
///
/// `Key` 需要至少 64 字节的材料，SHA-512 摘要正好满足
pub fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// 当前登录用户
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("请先登录".to_string()))
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().copied())
    }
}

/// 从签名 Cookie 中读取会话
pub fn read_session(jar: &SignedCookieJar) -> Option<CurrentUser> {
    let id = jar.get(USER_ID_COOKIE)?.value().parse::<i64>().ok()?;
    let role_cookie = jar.get(USER_ROLE_COOKIE)?;
    let (bound_id, role) = role_cookie.value().split_once(':')?;
    if bound_id.parse::<i64>().ok()? != id {
        return None;
    }
    let role = role.parse::<Role>().ok()?;
    Some(CurrentUser { id, role })
}

fn role_value(user_id: i64, role: Role) -> String {
    format!("{}:{}", user_id, role.as_str())
}

/// 写入会话 Cookie
pub fn start_session(
    jar: SignedCookieJar,
    settings: &SessionSettings,
    user_id: i64,
    role: Role,
) -> SignedCookieJar {
    jar.add(session_cookie(USER_ID_COOKIE, user_id.to_string(), settings))
        .add(session_cookie(USER_ROLE_COOKIE, role_value(user_id, role), settings))
}

/// 清除会话 Cookie
pub fn end_session(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(USER_ID_COOKIE).path("/"))
        .remove(Cookie::build(USER_ROLE_COOKIE).path("/"))
}

fn session_cookie(
    name: &'static str,
    value: String,
    settings: &SessionSettings,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(time::Duration::days(settings.max_age_days))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use axum::response::IntoResponse;

    fn settings() -> SessionSettings {
        SessionSettings {
            key: derive_key("test-secret-for-session-cookies"),
            max_age_days: 7,
            secure: false,
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let settings = settings();
        let jar = start_session(SignedCookieJar::new(settings.key.clone()), &settings, 42, Role::Seller);

        assert_eq!(
            read_session(&jar),
            Some(CurrentUser {
                id: 42,
                role: Role::Seller
            })
        );
    }

    #[test]
    fn test_unsigned_cookies_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("userId=1; userRole=admin"),
        );
        let jar = SignedCookieJar::from_headers(&headers, settings().key);

        assert_eq!(read_session(&jar), None);
    }

    #[test]
    fn test_cookies_signed_with_other_key_are_rejected() {
        let other = SessionSettings {
            key: derive_key("a-completely-different-secret"),
            ..settings()
        };
        let forged = start_session(SignedCookieJar::new(other.key.clone()), &other, 1, Role::Admin);
        let response = forged.into_response();

        let mut headers = HeaderMap::new();
        let pairs: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pairs.join("; ")).unwrap());

        let jar = SignedCookieJar::from_headers(&headers, settings().key);
        assert_eq!(read_session(&jar), None);
    }

    #[test]
    fn test_half_session_is_not_logged_in() {
        let settings = settings();
        let jar = SignedCookieJar::new(settings.key.clone()).add(session_cookie(
            USER_ID_COOKIE,
            "7".to_string(),
            &settings,
        ));

        assert_eq!(read_session(&jar), None);
    }

    /// 把 jar 的 Set-Cookie 转成请求 Cookie 对
    fn cookie_pairs(jar: SignedCookieJar) -> Vec<String> {
        jar.into_response()
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_spliced_sessions_are_not_logged_in() {
        let settings = settings();
        let customer = cookie_pairs(start_session(
            SignedCookieJar::new(settings.key.clone()),
            &settings,
            5,
            Role::Customer,
        ));
        let seller = cookie_pairs(start_session(
            SignedCookieJar::new(settings.key.clone()),
            &settings,
            6,
            Role::Seller,
        ));

        let user_id = customer.iter().find(|c| c.starts_with("userId=")).unwrap();
        let user_role = seller.iter().find(|c| c.starts_with("userRole=")).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}; {}", user_id, user_role)).unwrap(),
        );

        let jar = SignedCookieJar::from_headers(&headers, settings.key.clone());
        assert_eq!(read_session(&jar), None);
    }

    #[test]
    fn test_role_cookie_without_user_binding_is_rejected() {
        let settings = settings();
        let jar = SignedCookieJar::new(settings.key.clone())
            .add(session_cookie(USER_ID_COOKIE, "7".to_string(), &settings))
            .add(session_cookie(USER_ROLE_COOKIE, "seller".to_string(), &settings));

        assert_eq!(read_session(&jar), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let settings = settings();
        let response = start_session(SignedCookieJar::new(settings.key.clone()), &settings, 3, Role::Customer)
            .into_response();

        let cookies: Vec<&str> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert_eq!(cookies.len(), 2);
        for cookie in cookies {
            assert!(cookie.contains("HttpOnly"));
            assert!(cookie.contains("SameSite=Lax"));
            assert!(cookie.contains("Path=/"));
            assert!(cookie.contains("Max-Age=604800"));
            assert!(!cookie.contains("Secure"));
        }
    }
}
