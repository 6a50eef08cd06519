//! Token signing and hashing primitives shared by Tryon services

pub mod hash;
pub mod jwt;

pub use hash::{sha256, token_fingerprint};
pub use jwt::{AccessClaims, AccessTokenVerifier, JwtError, JwtKeys};
