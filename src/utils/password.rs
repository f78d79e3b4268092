use anyhow::{Context, Result};
use std::env;
use std::sync::OnceLock;

/// bcrypt work factor, taken from `BCRYPT_COST` and clamped to what bcrypt accepts.
fn cost() -> u32 {
    static COST: OnceLock<u32> = OnceLock::new();
    *COST.get_or_init(|| {
        env::var("BCRYPT_COST")
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .map(|c| c.clamp(4, 31))
            .unwrap_or(bcrypt::DEFAULT_COST)
    })
}

pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, cost()).context("Failed to hash password")
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
