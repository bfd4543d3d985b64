//! 认证模块
//!
//! 提供 JWT Token 生成与验证、密码哈希、重置令牌生成

mod jwt;
mod password;
mod reset_token;

pub use jwt::{AccessToken, Claims, JwtConfig, JwtManager};
pub use password::{hash_password, validate_new_password, verify_password};
pub use reset_token::{RESET_TOKEN_LENGTH, generate_reset_token};
