//! 密码处理

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::error::{FeedbackError, Result};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// 使用 bcrypt 生成密码哈希
pub fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).map_err(|e| FeedbackError::Internal(format!("密码哈希失败: {}", e)))
}

/// 比较明文密码与存储的哈希值
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    verify(password, hash).map_err(|e| FeedbackError::Internal(format!("密码验证失败: {}", e)))
}

/// 新密码长度校验
pub fn validate_new_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(FeedbackError::Validation(format!(
            "密码长度必须在 {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} 之间"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "test_password_123";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("long-enough").is_ok());
        assert!(validate_new_password(&"x".repeat(129)).is_err());
    }
}
