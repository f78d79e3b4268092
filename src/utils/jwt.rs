use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::config::jwt::JwtConfig;

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Must be called once at startup, before any token is issued.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("JWT config not initialized"))
}

pub fn refresh_token_ttl() -> Result<u64> {
    Ok(get_config()?.refresh_token_expiry)
}

pub fn access_token_ttl() -> Result<u64> {
    Ok(get_config()?.access_token_expiry)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub token_type: TokenType,
    /// Distinguishes tokens minted for the same user within the same second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

fn encode_token(user_id: &str, token_type: TokenType) -> Result<String> {
    let config = get_config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let ttl = match token_type {
        TokenType::Access => config.access_token_expiry,
        TokenType::Refresh => config.refresh_token_expiry,
    };
    let claims = Claims {
        sub: user_id.to_owned(),
        exp: now + ttl as usize,
        iat: now,
        token_type,
        jti: match token_type {
            TokenType::Refresh => Some(uuid::Uuid::new_v4().to_string()),
            TokenType::Access => None,
        },
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode {:?} token: {}", token_type, e))
}

pub fn encode_access_token(user_id: &str) -> Result<String> {
    encode_token(user_id, TokenType::Access)
}

pub fn encode_refresh_token(user_id: &str) -> Result<String> {
    encode_token(user_id, TokenType::Refresh)
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let config = get_config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
}

/// Refresh tokens are persisted as their hex SHA-256 digest.
pub fn hash_refresh_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
