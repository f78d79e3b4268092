use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

use crate::config::parse_bool_env;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
struct AuthCookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl AuthCookieConfig {
    fn from_env() -> Self {
        let same_site = parse_same_site(
            &env::var("AUTH_COOKIE_SAMESITE").unwrap_or_else(|_| "Lax".to_string()),
        );
        let mut secure = parse_bool_env("AUTH_COOKIE_SECURE", false);
        let domain = env::var("AUTH_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Browsers require SameSite=None cookies to also be Secure.
        if same_site == "None" {
            secure = true;
        }

        Self {
            secure,
            same_site,
            domain,
        }
    }
}

fn auth_cookie_config() -> &'static AuthCookieConfig {
    static CONFIG: OnceLock<AuthCookieConfig> = OnceLock::new();
    CONFIG.get_or_init(AuthCookieConfig::from_env)
}

fn parse_same_site(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

pub fn build_auth_cookie(name: &str, value: &str, max_age_seconds: u64) -> String {
    with_attributes(format!(
        "{name}={value}; Path=/; Max-Age={max_age_seconds}; HttpOnly"
    ))
}

pub fn build_clear_cookie(name: &str) -> String {
    with_attributes(format!(
        "{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly"
    ))
}

fn with_attributes(mut cookie: String) -> String {
    let config = auth_cookie_config();
    cookie.push_str("; SameSite=");
    cookie.push_str(config.same_site);

    if config.secure {
        cookie.push_str("; Secure");
    }

    if let Some(domain) = &config.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }

    cookie
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let mut parts = cookie.trim().splitn(2, '=');
                let key = parts.next()?.trim();
                let value = parts.next()?.trim();
                if key == name {
                    Some(value.to_string())
                } else {
                    None
                }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def; lang=id"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert_eq!(extract_cookie(&headers, REFRESH_TOKEN_COOKIE), None);
    }

    #[test]
    fn same_site_defaults_to_lax() {
        assert_eq!(parse_same_site("strict"), "Strict");
        assert_eq!(parse_same_site("NONE"), "None");
        assert_eq!(parse_same_site("bogus"), "Lax");
    }

    #[test]
    fn auth_cookie_is_http_only() {
        let cookie = build_auth_cookie(ACCESS_TOKEN_COOKIE, "t", 900);
        assert!(cookie.starts_with("access_token=t; Path=/; Max-Age=900; HttpOnly; SameSite="));
        assert!(build_clear_cookie(ACCESS_TOKEN_COOKIE).contains("Max-Age=0"));
    }
}
