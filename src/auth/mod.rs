/*!
 * # Admin authentication
 *
 * Single-operator login for the admin console. Credentials are the configured
 * username and an argon2 PHC hash. A successful login yields an HS256 JWT that
 * is returned in the body and set as the `admin_session` cookie.
 *
 * Protected routes accept the token from that cookie or from an
 * `Authorization: Bearer` header.
 */

use crate::{config::AppConfig, errors::ServiceError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "admin_session";
pub const ADMIN_ROLE: &str = "admin";
const ISSUER: &str = "hostel-api";

/// Claim structure for admin session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Authenticated admin, placed in request extensions by [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
    pub token_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) | AuthError::Hashing(msg) => {
                ServiceError::InternalError(msg)
            }
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Issues and validates admin sessions.
#[derive(Clone)]
pub struct AdminAuth {
    jwt_secret: String,
    session_secs: i64,
    username: String,
    password_hash: Option<String>,
    secure_cookies: bool,
}

impl AdminAuth {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            session_secs: config.admin_session_secs,
            username: config.admin_username.clone(),
            password_hash: config.admin_password_hash.clone(),
            secure_cookies: config.is_production(),
        }
    }

    pub fn session_secs(&self) -> i64 {
        self.session_secs
    }

    /// Checks the login pair. Without a configured hash every login fails.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            warn!("Admin login attempted but no password hash is configured");
            return false;
        };
        // Verify the hash even for an unknown username so both paths cost the same.
        let password_ok = verify_password(password, stored);
        password_ok && username == self.username
    }

    pub fn issue_token(&self, username: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.session_secs)).timestamp(),
            iss: ISSUER.to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if claims.role != ADMIN_ROLE {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    /// `Set-Cookie` value carrying a fresh session.
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE, token, self.session_secs
        );
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that expires the session.
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AdminUser, AuthError> {
        let token = token_from_headers(headers).ok_or(AuthError::MissingAuth)?;
        let claims = self.validate_token(&token)?;
        Ok(AdminUser {
            username: claims.sub,
            token_id: claims.jti,
        })
    }
}

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored admin password hash is malformed: {}", e);
            false
        }
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Session cookie first, then bearer header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| bearer_token(headers))
}

/// Middleware guarding the admin router.
pub async fn require_admin(
    State(auth): State<Arc<AdminAuth>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = auth.authenticate(request.headers())?;
    debug!(username = %user.username, "Admin request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth_with_password(password: &str) -> AdminAuth {
        let mut config = crate::test_support::test_config();
        config.admin_username = "admin".into();
        config.admin_password_hash = Some(hash_password(password).unwrap());
        AdminAuth::new(&config)
    }

    #[test]
    fn verifies_argon2_credentials() {
        let auth = auth_with_password("correct horse");
        assert!(auth.verify_credentials("admin", "correct horse"));
        assert!(!auth.verify_credentials("admin", "wrong"));
        assert!(!auth.verify_credentials("root", "correct horse"));
    }

    #[test]
    fn no_hash_means_no_login() {
        let mut config = crate::test_support::test_config();
        config.admin_password_hash = None;
        let auth = AdminAuth::new(&config);
        assert!(!auth.verify_credentials(&config.admin_username, "anything"));
    }

    #[test]
    fn token_round_trip_and_expiry() {
        let auth = auth_with_password("pw");
        let token = auth.issue_token("admin", Utc::now()).unwrap();
        assert_eq!(auth.validate_token(&token).unwrap().sub, "admin");

        let stale = auth
            .issue_token("admin", Utc::now() - Duration::days(30))
            .unwrap();
        assert!(matches!(
            auth.validate_token(&stale),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            auth.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn reads_cookie_before_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=from-cookie"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));

        headers.remove(header::COOKIE);
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_flags() {
        let auth = auth_with_password("pw");
        let cookie = auth.session_cookie("abc");
        assert!(cookie.starts_with("admin_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(!cookie.contains("Secure"), "development cookies are not Secure");
        assert!(auth.clear_cookie().contains("Max-Age=0"));
    }
}
