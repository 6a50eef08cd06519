/// Integration tests for crypto-core JWT functionality
///
/// This test module covers:
/// - Signing and verifying caller-defined claim sets
/// - Access token verification with audience checks
/// - Error classification for expired, forged and malformed tokens
use chrono::Utc;
use crypto_core::jwt::{AccessClaims, AccessTokenVerifier, JwtError, JwtKeys};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Test secrets - FOR TESTING ONLY
const TEST_SECRET: &str = "integration-test-secret-0123456789abcdefghij";
const OTHER_SECRET: &str = "a-completely-different-secret-9876543210zyxw";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SessionClaims {
    sub: String,
    exp: i64,
    user_type: String,
    ai_uses_remaining: u32,
}

fn session_claims(exp_offset_secs: i64) -> SessionClaims {
    SessionClaims {
        sub: Uuid::new_v4().to_string(),
        exp: Utc::now().timestamp() + exp_offset_secs,
        user_type: "individual".to_string(),
        ai_uses_remaining: 5,
    }
}

fn access_claims(user_id: Uuid, aud: &str, exp_offset_secs: i64) -> AccessClaims {
    let now = Utc::now().timestamp();
    AccessClaims {
        sub: user_id.to_string(),
        exp: now + exp_offset_secs,
        iat: Some(now),
        aud: Some(aud.to_string()),
        email: Some("owner@salon.test".to_string()),
        role: Some("authenticated".to_string()),
    }
}

// ============================================================================
// Session Token Tests
// ============================================================================

#[test]
fn test_session_claims_survive_signing() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let claims = session_claims(900);

    let token = keys.sign(&claims).expect("sign");
    let decoded: SessionClaims = keys.verify(&token, None).expect("verify");

    assert_eq!(decoded, claims);
}

#[test]
fn test_tampered_payload_rejected() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let token = keys.sign(&session_claims(900)).expect("sign");

    // Swap the payload for one granting more uses, keep the original signature
    let parts: Vec<&str> = token.split('.').collect();
    let forged_claims = SessionClaims {
        ai_uses_remaining: 500,
        ..session_claims(900)
    };
    let forged_token = keys.sign(&forged_claims).expect("sign");
    let forged_payload = forged_token.split('.').nth(1).expect("payload");
    let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    let err = keys.verify::<SessionClaims>(&tampered, None).unwrap_err();
    assert_eq!(err, JwtError::InvalidSignature);
}

#[test]
fn test_expired_forged_token_reports_signature_first() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let other = JwtKeys::from_secret(OTHER_SECRET).expect("keys");
    let token = other.sign(&session_claims(-60)).expect("sign");

    let err = keys.verify::<SessionClaims>(&token, None).unwrap_err();
    assert_eq!(err, JwtError::InvalidSignature);
}

#[test]
fn test_malformed_tokens_rejected() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let malformed_tokens = vec!["invalid", "two.parts", "", "...", "invalid!@#$.token"];

    for malformed in malformed_tokens {
        let result = keys.verify::<SessionClaims>(malformed, None);
        assert!(
            result.is_err(),
            "Should reject malformed token: {}",
            malformed
        );
    }
}

// ============================================================================
// Access Token Tests
// ============================================================================

#[test]
fn test_access_token_verified_for_audience() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let verifier = AccessTokenVerifier::new(keys.clone(), "authenticated");
    let user_id = Uuid::new_v4();

    let token = keys
        .sign(&access_claims(user_id, "authenticated", 3600))
        .expect("sign");
    let claims = verifier.verify(&token).expect("verify");

    assert_eq!(claims.user_id().expect("uuid"), user_id);
    assert_eq!(claims.email.as_deref(), Some("owner@salon.test"));
}

#[test]
fn test_access_token_wrong_audience_rejected() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let verifier = AccessTokenVerifier::new(keys.clone(), "authenticated");

    let token = keys
        .sign(&access_claims(Uuid::new_v4(), "anon", 3600))
        .expect("sign");

    assert_eq!(verifier.verify(&token).unwrap_err(), JwtError::InvalidAudience);
}

#[test]
fn test_access_token_expired_rejected() {
    let keys = JwtKeys::from_secret(TEST_SECRET).expect("keys");
    let verifier = AccessTokenVerifier::new(keys.clone(), "authenticated");

    let token = keys
        .sign(&access_claims(Uuid::new_v4(), "authenticated", -10))
        .expect("sign");

    assert_eq!(verifier.verify(&token).unwrap_err(), JwtError::Expired);
}

#[test]
fn test_access_token_non_uuid_subject() {
    let claims = AccessClaims {
        sub: "not-a-uuid".to_string(),
        exp: Utc::now().timestamp() + 60,
        iat: None,
        aud: None,
        email: None,
        role: None,
    };

    assert!(matches!(claims.user_id(), Err(JwtError::Malformed(_))));
}
