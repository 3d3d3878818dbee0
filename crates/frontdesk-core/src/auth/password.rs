//! Password credentials.
//!
//! Stored form: `pbkdf2_sha256$<iterations>$<salt hex>$<hash hex>`.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const DEFAULT_ITERATIONS: u32 = 100_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;
const SCHEME: &str = "pbkdf2_sha256";

/// Hashes new credentials and verifies stored ones.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let hash = derive(password, &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(hash)
        )
    }

    /// Check a password against a stored credential.
    ///
    /// Iterations come from the stored string, so credentials hashed under an
    /// older setting keep verifying. Malformed credentials never match.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        if scheme != SCHEME {
            return false;
        }
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
            return false;
        };
        if iterations == 0 || expected.len() != HASH_LENGTH {
            return false;
        }

        let actual = derive(password, &salt, iterations);
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::new(1_000)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = fast();
        let stored = hasher.hash("admin123");
        assert!(stored.starts_with("pbkdf2_sha256$1000$"));
        assert!(hasher.verify("admin123", &stored));
        assert!(!hasher.verify("admin124", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = fast();
        assert_ne!(hasher.hash("same"), hasher.hash("same"));
    }

    #[test]
    fn test_iterations_read_from_stored_credential() {
        let stored = PasswordHasher::new(500).hash("secret");
        assert!(fast().verify("secret", &stored));
    }

    #[test]
    fn test_malformed_credentials_never_match() {
        let hasher = fast();
        for stored in [
            "",
            "plaintext",
            "pbkdf2_sha256$1000$zz$00",
            "bcrypt$1000$00$00",
            "pbkdf2_sha256$0$00$0000000000000000000000000000000000000000000000000000000000000000",
            "pbkdf2_sha256$1000$00$00$extra",
        ] {
            assert!(!hasher.verify("anything", stored), "{}", stored);
        }
    }
}
