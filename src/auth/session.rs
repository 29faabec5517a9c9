use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "session";

/// Signed session token payload: just the user id and expiry. The full user
/// row (role included) is re-read from the database on every request, so a
/// role change takes effect on the next request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies signed session tokens and builds their cookies.
#[derive(Clone)]
pub struct Sessions {
    config: SessionConfig,
}

impl Sessions {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Issue a token for the given user. `remember` selects the long-lived
    /// expiry used with a persistent cookie.
    pub fn issue(&self, user_id: i32, remember: bool) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let ttl = if remember {
            self.config.remember_ttl_secs
        } else {
            self.config.ttl_secs
        };
        let claims = Claims {
            sub: user_id,
            exp: (now + Duration::seconds(ttl as i64)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
    }

    /// Resolve a token back to the user id it was issued for. Expired or
    /// tampered tokens yield `None`.
    pub fn verify(&self, token: &str) -> Option<i32> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
        .ok()?;
        Some(decoded.claims.sub)
    }

    /// Cookie establishing the session. Session-only by default; with
    /// `remember` the cookie persists for the long-lived token's lifetime.
    pub fn cookie(&self, token: &str, remember: bool) -> String {
        let base = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
        if remember {
            format!("{}; Max-Age={}", base, self.config.remember_ttl_secs)
        } else {
            base
        }
    }

    /// Cookie invalidating the session immediately.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// Extract the session token from a request's Cookie header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("cookie")?.to_str().ok()?;
    for pair in raw.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix(&format!("{}=", SESSION_COOKIE)) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn sessions() -> Sessions {
        Sessions::new(SessionConfig {
            secret: "test-secret".to_string(),
            ttl_secs: 3600,
            remember_ttl_secs: 86400,
        })
    }

    #[test]
    fn token_round_trips() {
        let sessions = sessions();
        let token = sessions.issue(42, false).unwrap();
        assert_eq!(sessions.verify(&token), Some(42));
    }

    #[test]
    fn tampered_and_foreign_tokens_are_rejected() {
        let sessions = sessions();
        let token = sessions.issue(42, false).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert_eq!(sessions.verify(&tampered), None);

        let other = Sessions::new(SessionConfig {
            secret: "different-secret".to_string(),
            ttl_secs: 3600,
            remember_ttl_secs: 86400,
        });
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn remember_me_selects_persistent_cookie() {
        let sessions = sessions();
        assert!(!sessions.cookie("t", false).contains("Max-Age"));
        assert!(sessions.cookie("t", true).contains("Max-Age=86400"));
        assert!(sessions.clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; session=abc.def.ghi; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert("cookie", HeaderValue::from_static("session="));
        assert_eq!(token_from_headers(&headers), None);
    }
}
