/// Shared JWT signing and validation for Tryon services
///
/// This module wraps `jsonwebtoken` with HS256 (HMAC with SHA-256) keys derived
/// from a shared secret. Two kinds of tokens flow through it:
///
/// - **Session tokens** minted by the try-on service for individual users.
///   The claim set is owned by the caller, so signing and verification are
///   generic over any `Serialize` / `DeserializeOwned` type.
/// - **Access tokens** minted by the external auth provider for salon owners.
///   These are verified only, against the provider's JWT secret and audience.
///
/// ## Key Handling
///
/// Keys live in a [`JwtKeys`] value built once at startup from configuration and
/// handed to whoever needs them. There is no process-global key store, so two
/// services (or two tests) can hold different secrets side by side.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Claims { sub: String, exp: i64 }
///
/// let keys = JwtKeys::from_secret("an-example-secret-that-is-long-enough").unwrap();
/// let exp = chrono::Utc::now().timestamp() + 60;
/// let token = keys.sign(&Claims { sub: "abc".into(), exp }).unwrap();
/// let claims: Claims = keys.verify(&token, None).unwrap();
/// assert_eq!(claims.sub, "abc");
/// ```
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// JWT algorithm shared by session tokens and provider access tokens
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Shortest secret accepted for HMAC signing (bytes)
pub const MIN_SECRET_LEN: usize = 32;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token audience is invalid")]
    InvalidAudience,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Signing key is invalid: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            ErrorKind::InvalidAudience => JwtError::InvalidAudience,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                JwtError::InvalidSignature
            }
            _ => JwtError::Malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Key Storage
// ============================================================================

/// HMAC key pair derived from a single shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &JWT_ALGORITHM)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from a shared secret
    ///
    /// ## Errors
    ///
    /// Returns `JwtError::InvalidKey` when the secret is shorter than
    /// [`MIN_SECRET_LEN`] bytes after trimming.
    pub fn from_secret(secret: &str) -> Result<Self, JwtError> {
        let secret = secret.trim();
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::InvalidKey(format!(
                "secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Sign a claim set
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::new(JWT_ALGORITHM), claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify signature, `exp` and (optionally) `aud`, then decode the claims
    ///
    /// ## Security Guarantees
    ///
    /// - HS256 only; tokens declaring any other algorithm are rejected
    /// - Zero leeway on `exp`, so expiry is exact to the second
    /// - Signature is checked before any claim is inspected, so a forged
    ///   token never reaches claim validation
    pub fn verify<T: DeserializeOwned>(
        &self,
        token: &str,
        audience: Option<&str>,
    ) -> Result<T, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

// ============================================================================
// Provider Access Tokens
// ============================================================================

/// Claims carried by access tokens issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (provider user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AccessClaims {
    /// Parse the subject as a user UUID
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub)
            .map_err(|e| JwtError::Malformed(format!("invalid subject: {e}")))
    }
}

/// Verifies provider-issued access tokens for a fixed audience
#[derive(Debug, Clone)]
pub struct AccessTokenVerifier {
    keys: JwtKeys,
    audience: String,
}

impl AccessTokenVerifier {
    pub fn new(keys: JwtKeys, audience: impl Into<String>) -> Self {
        Self {
            keys,
            audience: audience.into(),
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate an access token (without the "Bearer " prefix)
    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.keys.verify(token, Some(&self.audience))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TEST_SECRET: &str = "unit-test-secret-0123456789abcdef0123456789";

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        exp: i64,
        remaining: u32,
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = JwtKeys::from_secret("too-short").unwrap_err();
        assert!(matches!(err, JwtError::InvalidKey(_)));
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();
        let claims = TestClaims {
            sub: "session".into(),
            exp: Utc::now().timestamp() + 300,
            remaining: 4,
        };

        let token = keys.sign(&claims).unwrap();
        assert_eq!(token.matches('.').count(), 2); // JWT has 3 parts

        let decoded: TestClaims = keys.verify(&token, None).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_expired_token() {
        let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();
        let claims = TestClaims {
            sub: "session".into(),
            exp: Utc::now().timestamp() - 5,
            remaining: 1,
        };
        let token = keys.sign(&claims).unwrap();

        let err = keys.verify::<TestClaims>(&token, None).unwrap_err();
        assert_eq!(err, JwtError::Expired);
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();
        let other = JwtKeys::from_secret("another-secret-abcdefghijklmnopqrstuvwxyz").unwrap();
        let token = other
            .sign(&TestClaims {
                sub: "x".into(),
                exp: Utc::now().timestamp() + 60,
                remaining: 1,
            })
            .unwrap();

        let err = keys.verify::<TestClaims>(&token, None).unwrap_err();
        assert_eq!(err, JwtError::InvalidSignature);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();
        let err = keys.verify::<TestClaims>("not-a-token", None).unwrap_err();
        assert!(matches!(err, JwtError::Malformed(_)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();
        let rendered = format!("{:?}", keys);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(TEST_SECRET));
    }
}
