//! JWT Token 处理
//!
//! 载荷只包含用户 id、角色能力和时间声明；权限判断以数据库中的角色为准。

use chrono::{DateTime, Duration, Utc};
use hrm_shared::config::AuthConfig;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{FeedbackError, Result};
use crate::models::RoleCapability;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// 签名密钥
    pub secret: String,
    /// Token 有效期（秒）
    pub expires_in_secs: i64,
    /// Token 签发者
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expires_in_secs: config.access_token_expire_minutes * 60,
            issuer: config.jwt_issuer.clone(),
        }
    }
}

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    /// 签发时的角色能力，仅供前端展示
    pub role: RoleCapability,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| FeedbackError::TokenInvalid)
    }
}

/// 登录返回的访问令牌
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT Token
    pub fn generate_token(&self, user_id: i64, role: RoleCapability) -> Result<AccessToken> {
        self.generate_token_at(user_id, role, Utc::now())
    }

    /// 以指定签发时间生成 Token
    pub fn generate_token_at(
        &self,
        user_id: i64,
        role: RoleCapability,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken> {
        let exp = issued_at + Duration::seconds(self.config.expires_in_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FeedbackError::Internal(format!("JWT 生成失败: {}", e)))?;

        Ok(AccessToken {
            access_token: token,
            token_type: "bearer",
            expires_at: exp,
        })
    }

    /// 验证签名、签发者与过期时间
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.config.expires_in_secs
    }
}
