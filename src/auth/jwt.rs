//! JWT token management
//!
//! API 调用方使用的 Bearer 令牌：签发（运维与测试用）和校验

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{BridgeError, Result};

/// JWT 载荷
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    /// 用户ID
    pub sub: String,
    pub is_admin: bool,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    /// JWT ID
    pub jti: String,
}

impl JwtClaims {
    /// 获取用户ID
    pub fn user_id(&self) -> Result<i32> {
        self.sub
            .parse()
            .map_err(|e| BridgeError::auth_with_source("令牌中的用户ID无效", e))
    }
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create new JWT manager
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(BridgeError::config("JWT 密钥不能为空"));
        }

        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30; // 30 seconds tolerance

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl_secs: config.token_ttl_secs,
        })
    }

    /// Generate access token
    pub fn generate_token(&self, user_id: i32, is_admin: bool) -> Result<String> {
        self.generate_token_with_ttl(user_id, is_admin, self.ttl_secs)
    }

    pub fn generate_token_with_ttl(&self, user_id: i32, is_admin: bool, ttl_secs: i64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            is_admin,
            iat: now,
            exp: now + ttl_secs,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| BridgeError::internal_with_source("生成令牌失败", e))
    }

    /// Validate and parse token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        let token_data: TokenData<JwtClaims> = decode(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    BridgeError::auth("认证令牌已过期")
                }
                _ => BridgeError::auth_with_source("认证令牌无效", e),
            })?;

        Ok(token_data.claims)
    }
}
