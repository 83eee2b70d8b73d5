//! JWT authentication module.
//!
//! Issues access tokens at login and guards the caixa routes.
//!
//! ## Guard Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Auth Guard                                      │
//! │                                                                         │
//! │  Authorization: Bearer <jwt>                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  extract_bearer_token ──► JwtManager::validate_access_token            │
//! │       │                           │                                     │
//! │       │ missing / bad scheme      │ bad signature / expired / refresh  │
//! │       ▼                           ▼                                     │
//! │  ┌───────────────────────┐   ┌──────────────────────────────────────┐  │
//! │  │ Operator (required)   │   │ MaybeOperator (optional)             │  │
//! │  │ → 401 UNAUTHORIZED,   │   │ → MaybeOperator(None), handler runs  │  │
//! │  │   handler never runs  │   │   as anonymous                       │  │
//! │  └───────────────────────┘   └──────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pdv_db::{Database, DbError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// `token_type` claim of access tokens.
pub const ACCESS_TOKEN_TYPE: &str = "access";

// =============================================================================
// Claims & Errors
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (operator id)
    pub sub: String,

    /// Operator username, recorded as `opened_by` / `closed_by`
    pub username: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access")
    pub token_type: String,
}

/// Why a request could not be authenticated.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredentials,

    #[error("Authorization header is not a bearer token")]
    InvalidScheme,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    Expired,

    #[error("Expected access token")]
    WrongTokenType,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),
}

// =============================================================================
// JWT Manager
// =============================================================================

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
    pub claims: Claims,
}

/// JWT token manager (HS256, shared secret).
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    validation: Validation,
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("secret", &"<redacted>")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .finish()
    }
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expired means expired; the access lifetime already absorbs clock drift
        validation.leeway = 0;
        validation.validate_exp = true;

        JwtManager {
            secret,
            access_lifetime_secs,
            validation,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Issue an access token for an operator, valid from now.
    pub fn issue(&self, operator_id: &str, username: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(operator_id, username, Utc::now())
    }

    /// Issue an access token as if signed at `now`.
    pub fn issue_at(
        &self,
        operator_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: operator_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.access_lifetime_secs,
            claims,
        })
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &self.validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
///
/// The scheme is matched case-insensitively; an empty token is no token.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Runs the guard decision against a request's headers.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtManager) -> Result<Claims, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    let token = extract_bearer_token(header).ok_or(AuthError::InvalidScheme)?;
    jwt.validate_access_token(token)
}

// =============================================================================
// Extractors
// =============================================================================

/// Required-mode guard: the handler only runs for an authenticated operator.
#[derive(Debug, Clone)]
pub struct Operator(pub Claims);

impl Operator {
    pub fn id(&self) -> &str {
        &self.0.sub
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequestParts<Arc<AppState>> for Operator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, &state.jwt) {
            Ok(claims) => Ok(Operator(claims)),
            Err(err) => {
                debug!(path = %parts.uri.path(), reason = %err, "Rejected unauthenticated request");
                Err(err.into())
            }
        }
    }
}

/// Optional-mode guard: `None` for anonymous or invalid credentials.
#[derive(Debug, Clone)]
pub struct MaybeOperator(pub Option<Claims>);

impl FromRequestParts<Arc<AppState>> for MaybeOperator {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let claims = match authenticate(&parts.headers, &state.jwt) {
            Ok(claims) => Some(claims),
            Err(AuthError::MissingCredentials) => None,
            Err(err) => {
                debug!(path = %parts.uri.path(), reason = %err, "Ignoring invalid credentials");
                None
            }
        };
        Ok(MaybeOperator(claims))
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Verify a password against its argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

// =============================================================================
// Admin Bootstrap
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Creates the first operator when no operator exists yet.
///
/// Returns `true` when an account was created.
pub async fn bootstrap_admin(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<bool, BootstrapError> {
    let operators = db.operators();
    if operators.count().await? > 0 {
        return Ok(false);
    }

    let hash = hash_password(password)?;
    let admin = operators.create(username, username, &hash).await?;
    info!(id = %admin.id, username = %admin.username, "Bootstrap operator created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        JwtManager::new("test-secret".to_string(), 3600)
    }

    #[test]
    fn test_jwt_roundtrip() {
        let jwt = manager();
        let issued = jwt.issue("op-1", "ana").unwrap();

        let claims = jwt.validate_access_token(&issued.access_token).unwrap();
        assert_eq!(claims.sub, "op-1");
        assert_eq!(claims.username, "ana");
        assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(issued.expires_in, 3600);
    }

    #[test]
    fn test_expired_token() {
        let jwt = manager();
        let issued = jwt
            .issue_at("op-1", "ana", Utc::now() - Duration::hours(2))
            .unwrap();

        assert!(matches!(
            jwt.validate_access_token(&issued.access_token),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let issued = manager().issue("op-1", "ana").unwrap();
        let other = JwtManager::new("other-secret".to_string(), 3600);

        assert!(matches!(
            other.validate_access_token(&issued.access_token),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            other.validate_access_token("not.a.jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_token_type() {
        let claims = Claims {
            sub: "op-1".into(),
            username: "ana".into(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            jti: "j".into(),
            token_type: "refresh".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            manager().validate_access_token(&token),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }

    #[test]
    fn test_authenticate_headers() {
        let jwt = manager();
        let mut headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&headers, &jwt),
            Err(AuthError::MissingCredentials)
        ));

        headers.insert(AUTHORIZATION, "Token xyz".parse().unwrap());
        assert!(matches!(
            authenticate(&headers, &jwt),
            Err(AuthError::InvalidScheme)
        ));

        let issued = jwt.issue("op-1", "ana").unwrap();
        headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", issued.access_token).parse().unwrap(),
        );
        assert_eq!(authenticate(&headers, &jwt).unwrap().username, "ana");
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("s3nha-forte").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3nha-forte", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3nha-forte", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() {
        let db = Database::new(pdv_db::DbConfig::in_memory()).await.unwrap();

        assert!(bootstrap_admin(&db, "admin", "admin123").await.unwrap());
        assert!(!bootstrap_admin(&db, "other", "pw").await.unwrap());

        let admin = db.operators().find_by_username("admin").await.unwrap().unwrap();
        assert!(verify_password("admin123", &admin.password_hash));
        assert!(db.operators().find_by_username("other").await.unwrap().is_none());
    }
}
