//! 密码处理
//!
//! bcrypt 计算量较大，放到阻塞线程池执行，避免占用异步运行时

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::{Result, StoreError};

/// 对密码进行哈希处理
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| StoreError::Internal(format!("密码哈希任务失败: {}", e)))?
        .map_err(|e| StoreError::Internal(format!("密码哈希失败: {}", e)))
}

/// 验证密码
///
/// 存储的哈希格式非法时视为不匹配
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let matched = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| StoreError::Internal(format!("密码验证任务失败: {}", e)))?;

    Ok(matched.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let password = "castle_keeper_123";
        let hashed = hash_password(password).await.unwrap();

        assert_ne!(hashed, password);
        assert!(verify_password(password, &hashed).await.unwrap());
        assert!(!verify_password("wrong_password", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_does_not_match() {
        assert!(!verify_password("anything", "plaintext-not-a-hash").await.unwrap());
    }
}
