use sha2::{Digest, Sha256};

/// Compute SHA256 hash of input bytes
pub fn sha256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

/// Short, non-reversible fingerprint of a token for logs
///
/// Tokens are bearer credentials and must never be logged verbatim; the first
/// 8 bytes of the SHA-256 digest are enough to correlate log lines.
pub fn token_fingerprint(token: &str) -> String {
    hex::encode(&sha256(token.as_bytes())[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let input = b"hello world";
        let hash = sha256(input);
        assert_eq!(hash.len(), 32);

        // Verify deterministic
        let hash2 = sha256(input);
        assert_eq!(hash, hash2);
    }

    #[test]
    fn test_token_fingerprint_is_short_hex() {
        let fp = token_fingerprint("header.payload.signature");
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(fp, token_fingerprint("header.payload.other"));
    }
}
