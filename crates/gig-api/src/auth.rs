//! Caller identity.
//!
//! Two kinds of bearer credential are accepted: the operator's bootstrap
//! credential, compared verbatim against configuration, and HS512-signed
//! tokens issued at login. Both resolve to an [`Identity`]; the source is
//! kept so that operations reserved for the operator can insist on it.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use gig_models::{Role, User, UserId};
use gig_store::UserRepository;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidScheme,

    #[error("Credential has expired")]
    Expired,

    #[error("Credential signature is invalid")]
    InvalidSignature,

    #[error("Malformed credential")]
    Malformed,

    #[error("Credential refers to an unknown user")]
    UnknownUser,

    #[error("Failed to issue credential: {0}")]
    Issue(String),
}

/// Where an identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Bootstrap,
    Signed,
}

/// Resolved caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub source: CredentialSource,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin identity that came from the bootstrap credential itself.
    pub fn is_bootstrap_admin(&self) -> bool {
        self.source == CredentialSource::Bootstrap && self.is_admin()
    }
}

/// Signed token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and resolves bearer credentials.
pub struct IdentityResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    bootstrap_credential: String,
    token_ttl: Duration,
}

impl IdentityResolver {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            validation,
            bootstrap_credential: config.bootstrap_credential.clone(),
            token_ttl: config.token_ttl,
        }
    }

    /// Issue a signed credential for a stored user.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            iat: now,
            exp: now + self.token_ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// The operator credential handed out by admin login.
    pub fn bootstrap_credential(&self) -> &str {
        &self.bootstrap_credential
    }

    /// Resolve a bearer credential to an identity.
    pub fn resolve(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        if credential == self.bootstrap_credential {
            return Ok(Identity {
                user_id: UserId::BOOTSTRAP_ADMIN,
                role: Role::Admin,
                source: CredentialSource::Bootstrap,
            });
        }

        let data = decode::<Claims>(credential, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            },
        )?;

        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| AuthError::Malformed)?;

        debug!(user_id = %user_id, role = %data.claims.role, "Resolved signed credential");

        Ok(Identity {
            user_id,
            role: data.claims.role,
            source: CredentialSource::Signed,
        })
    }
}

/// Pull the bearer credential out of request headers.
pub fn bearer_credential(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::InvalidScheme)
}

/// Authenticated caller extractor.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(&parts.headers)?;
        let identity = state.identity.resolve(credential)?;

        // Signed credentials outlive their accounts; the bootstrap admin has none.
        if identity.source == CredentialSource::Signed
            && UserRepository::get(state.store.as_ref(), identity.user_id)
                .await?
                .is_none()
        {
            warn!(user_id = %identity.user_id, "Credential presented for a deleted user");
            return Err(AuthError::UnknownUser.into());
        }

        Ok(Caller(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(&AuthConfig::new(SECRET, "operator-credential"))
    }

    fn user(id: i64, role: Role) -> User {
        let mut user = User::draft("Test", "test@example.com", role);
        user.id = UserId(id);
        user
    }

    #[test]
    fn test_bootstrap_credential() {
        let identity = resolver().resolve("operator-credential").unwrap();
        assert_eq!(identity.user_id, UserId::BOOTSTRAP_ADMIN);
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.is_bootstrap_admin());
    }

    #[test]
    fn test_issue_and_resolve() {
        let resolver = resolver();
        let token = resolver.issue(&user(7, Role::Freelancer)).unwrap();
        let identity = resolver.resolve(&token).unwrap();
        assert_eq!(identity.user_id, UserId(7));
        assert_eq!(identity.role, Role::Freelancer);
        assert_eq!(identity.source, CredentialSource::Signed);
        assert!(!identity.is_bootstrap_admin());
    }

    #[test]
    fn test_signed_admin_is_not_bootstrap() {
        let resolver = resolver();
        let token = resolver.issue(&user(3, Role::Admin)).unwrap();
        let identity = resolver.resolve(&token).unwrap();
        assert!(identity.is_admin());
        assert!(!identity.is_bootstrap_admin());
    }

    #[test]
    fn test_expired_credential() {
        let resolver = resolver();
        let now = Utc::now().timestamp();
        let token = resolver
            .sign(&Claims {
                sub: "7".to_string(),
                role: Role::Client,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(resolver.resolve(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_foreign_signature() {
        let other = IdentityResolver::new(&AuthConfig::new(
            "ffffffffffffffffffffffffffffffff",
            "other",
        ));
        let token = other.issue(&user(7, Role::Client)).unwrap();
        assert_eq!(resolver().resolve(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_garbage_and_bad_subject() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("not-a-token"), Err(AuthError::Malformed));
        assert_eq!(resolver.resolve(""), Err(AuthError::MissingCredential));

        let now = Utc::now().timestamp();
        let token = resolver
            .sign(&Claims {
                sub: "abc".to_string(),
                role: Role::Client,
                iat: now,
                exp: now + 60,
            })
            .unwrap();
        assert_eq!(resolver.resolve(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn test_bearer_credential() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_credential(&headers), Err(AuthError::MissingCredential));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_credential(&headers), Err(AuthError::InvalidScheme));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_credential(&headers), Ok("abc.def"));
    }
}
