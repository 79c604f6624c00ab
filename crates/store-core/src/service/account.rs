//! 账号服务
//!
//! 注册、登录、当前用户查询，以及管理员的用户管理

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{Result, StoreError};
use crate::models::{NewNotification, NotificationType, Role, User, UserProfile};
use crate::password::{hash_password, verify_password};
use crate::repository::UserRepository;
use crate::service::notification::NotificationService;

/// 账号服务
pub struct AccountService {
    user_repo: Arc<UserRepository>,
    notifications: Arc<NotificationService>,
}

impl AccountService {
    pub fn new(user_repo: Arc<UserRepository>, notifications: Arc<NotificationService>) -> Self {
        Self {
            user_repo,
            notifications,
        }
    }

    /// 注册新买家账号
    ///
    /// 新账号角色为 customer，积分为 0
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if self.user_repo.exists(username, email).await? {
            return Err(StoreError::DuplicateUser);
        }

        let password_hash = hash_password(password).await?;
        // 并发注册由唯一约束兜底
        let user = self
            .user_repo
            .create(username, email, &password_hash, Role::Customer)
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// 邮箱密码登录
    ///
    /// 邮箱不存在和密码错误返回同一个错误，不暴露账号是否存在
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            warn!("Login failed: unknown email");
            return Err(StoreError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login failed: wrong password");
            return Err(StoreError::InvalidCredentials);
        }

        info!(user_id = user.id, role = %user.role, "User logged in");
        Ok(user)
    }

    pub async fn current_user(&self, id: i64) -> Result<UserProfile> {
        self.user_repo
            .get(id)
            .await?
            .map(UserProfile::from)
            .ok_or(StoreError::UserNotFound(id))
    }

    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>> {
        let users = self.user_repo.list(role).await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// 修改用户角色并通知该用户
    #[instrument(skip(self))]
    pub async fn change_role(&self, admin_id: i64, id: i64, role: Role) -> Result<UserProfile> {
        if admin_id == id && role != Role::Admin {
            return Err(StoreError::Validation("不能移除自己的管理员角色".to_string()));
        }

        let user = self
            .user_repo
            .update_role(id, role)
            .await?
            .ok_or(StoreError::UserNotFound(id))?;

        let notification = NewNotification::new(
            NotificationType::System,
            "Role Updated",
            format!("Your account role is now {}.", role),
            None,
        );
        if let Err(e) = self.notifications.notify(user.id, &notification).await {
            warn!(user_id = user.id, error = %e, "Failed to send role change notification");
        }

        info!(admin_id, user_id = user.id, role = %role, "User role changed");
        Ok(UserProfile::from(user))
    }
}
