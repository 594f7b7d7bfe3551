//! Content digests for cache integrity.

use sha2::{Digest, Sha256};

/// Compute the `sha256:<hex>` digest of a string.
pub fn compute_digest(content: &str) -> String {
    sha256_hex_bytes(content.as_bytes())
}

pub(crate) fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_shape() {
        let digest = compute_digest("{\"sampling_rate\": 16000}");
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), 7 + 64);
        assert!(digest[7..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(compute_digest("abc"), compute_digest("abc"));
        assert_ne!(compute_digest("abc"), compute_digest("abd"));
    }
}
