use sha2::{Digest, Sha256};

/// Compute the stored digest for a password: hex(SHA-256(salt || password)).
///
/// The salt is fixed per deployment (the session secret), matching the
/// single-digest scheme the users table was populated with. Plaintext is
/// never stored or logged.
pub fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a candidate password against a stored digest.
pub fn verify(salt: &str, password: &str, stored: &str) -> bool {
    // Compare digests, not plaintext; both sides are fixed-length hex
    digest(salt, password) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_salted() {
        let a = digest("salt-1", "hunter2");
        let b = digest("salt-1", "hunter2");
        let c = digest("salt-2", "hunter2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn verify_accepts_correct_and_rejects_wrong_password() {
        let stored = digest("pepper", "correct horse");
        assert!(verify("pepper", "correct horse", &stored));
        assert!(!verify("pepper", "wrong horse", &stored));
        assert!(!verify("other", "correct horse", &stored));
    }
}
