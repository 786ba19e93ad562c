use lumino_types::{LuminoError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Commitment hash (hex-encoded SHA256 of the secret)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommitmentHash(String);

impl CommitmentHash {
    /// Parse from hex string
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != 64 {
            return Err(LuminoError::InvalidCommitment(
                "commitment hash must be 64 hex characters".to_string(),
            ));
        }
        hex::decode(hex).map_err(|_| {
            LuminoError::InvalidCommitment("invalid hex encoding".to_string())
        })?;
        Ok(CommitmentHash(hex.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitmentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute commitment hash: H(secret)
pub fn compute_commitment(secret: &[u8]) -> CommitmentHash {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    CommitmentHash(hex::encode(hasher.finalize()))
}

/// Verify a commitment against a revealed secret
pub fn verify_commitment(commitment: &CommitmentHash, secret: &[u8]) -> bool {
    compute_commitment(secret) == *commitment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_computation() {
        let commitment = compute_commitment(b"random_secret_12345");

        assert_eq!(commitment.as_str().len(), 64); // SHA256 hex
        assert!(verify_commitment(&commitment, b"random_secret_12345"));

        // Different secret should produce different commitment
        assert_ne!(commitment, compute_commitment(b"different_secret"));
    }

    #[test]
    fn test_commitment_verification_fails() {
        let commitment = compute_commitment(b"s1");
        assert!(!verify_commitment(&commitment, b"s2"));
        assert!(!verify_commitment(&commitment, b""));
    }

    #[test]
    fn test_from_hex() {
        let commitment = compute_commitment(b"abc");
        let upper = commitment.as_str().to_uppercase();
        assert_eq!(CommitmentHash::from_hex(&upper).unwrap(), commitment);

        assert!(CommitmentHash::from_hex("abcd").is_err());
        assert!(CommitmentHash::from_hex(&"zz".repeat(32)).is_err());
    }
}
