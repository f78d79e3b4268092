use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }

    /// Parses `per_second:burst`, e.g. `10:20`.
    fn parse(raw: &str) -> Result<Self, String> {
        let (per_second, burst) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw.trim()))?;

        let per_second: u64 = per_second
            .trim()
            .parse()
            .map_err(|_| format!("invalid per_second '{}'", per_second.trim()))?;
        let burst_size: u32 = burst
            .trim()
            .parse()
            .map_err(|_| format!("invalid burst_size '{}'", burst.trim()))?;

        if per_second == 0 || burst_size == 0 {
            return Err("per_second and burst_size must be > 0".to_string());
        }
        Ok(Self::new(per_second, burst_size))
    }
}

/// Route groups that get their own limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Auth,
    PublicRead,
    Protected,
}

impl RouteGroup {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => Some(Self::Auth),
            "public" | "public_read" | "public-read" => Some(Self::PublicRead),
            "protected" => Some(Self::Protected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(3, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 30),
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_CONFIG` is either a global `per:burst` or a list such as
    /// `auth=5:10,public=30:60,protected=10:20`. Invalid values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }
        cfg
    }

    pub fn rule(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Auth => self.auth,
            RouteGroup::PublicRead => self.public_read,
            RouteGroup::Protected => self.protected,
        }
    }

    fn set(&mut self, group: RouteGroup, rule: RateLimitRule) {
        match group {
            RouteGroup::Auth => self.auth = rule,
            RouteGroup::PublicRead => self.public_read = rule,
            RouteGroup::Protected => self.protected = rule,
        }
    }

    /// Applies every rule in `raw` or none of them.
    fn apply(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty value".to_string());
        }

        if !trimmed.contains('=') {
            let rule = RateLimitRule::parse(trimmed)?;
            for group in [RouteGroup::Auth, RouteGroup::PublicRead, RouteGroup::Protected] {
                self.set(group, rule);
            }
            return Ok(());
        }

        let mut staged = *self;
        for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (name, rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let group = RouteGroup::from_name(name).ok_or_else(|| {
                format!(
                    "unknown group '{}', expected auth/public/protected",
                    name.trim()
                )
            })?;
            staged.set(group, RateLimitRule::parse(rule)?);
        }
        *self = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_rule_applies_to_every_group() {
        let mut cfg = RateLimitConfig::default();
        cfg.apply("12:24").unwrap();
        assert_eq!(cfg.rule(RouteGroup::Auth), RateLimitRule::new(12, 24));
        assert_eq!(cfg.rule(RouteGroup::Protected), RateLimitRule::new(12, 24));
    }

    #[test]
    fn grouped_rules_only_touch_named_groups() {
        let mut cfg = RateLimitConfig::default();
        cfg.apply("auth=1:2, public-read=8:16").unwrap();
        assert_eq!(cfg.auth, RateLimitRule::new(1, 2));
        assert_eq!(cfg.public_read, RateLimitRule::new(8, 16));
        assert_eq!(cfg.protected, RateLimitConfig::default().protected);
    }

    #[test]
    fn invalid_rule_leaves_config_untouched() {
        let mut cfg = RateLimitConfig::default();
        let err = cfg.apply("auth=1:2,gallery=1:1").unwrap_err();
        assert!(err.contains("unknown group"));
        assert_eq!(cfg.auth, RateLimitConfig::default().auth);
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert!(RateLimitRule::parse("0:5").is_err());
        assert!(RateLimitRule::parse("5:0").is_err());
        assert!(RateLimitRule::parse("abc").is_err());
    }
}
