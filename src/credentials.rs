//! Admin credential derivation and storage.
//!
//! The single admin password is never stored; the settings file carries a
//! random salt, a PBKDF2-HMAC-SHA256 hash, and the iteration count. The
//! generator utility, the verifier utility, and the web login all derive
//! through this module so the parameters exist in exactly one place.

use std::io;
use std::path::Path;

use anyhow::Context;
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::settings::SettingsFile;

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 32;
pub const DEFAULT_ITERATIONS: u32 = 200_000;

/// Settings keys making up a credential record.
pub const KEY_SALT: &str = "ADMIN_SALT";
pub const KEY_HASH: &str = "ADMIN_HASH";
pub const KEY_ITERATIONS: &str = "ADMIN_ITER";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("settings file {path} not found (run runboard-passwd to create it)")]
    FileMissing { path: String },
    #[error("failed to read settings file {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{key} is missing from {path} (run runboard-passwd to set the admin password)")]
    KeyMissing { key: &'static str, path: String },
    #[error("{key} is not valid hex")]
    InvalidHex { key: &'static str },
    #[error("{key} must be {expected} bytes of hex, found {actual}")]
    InvalidLength {
        key: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{key} must be a positive integer, found {value:?}")]
    InvalidIterations { key: &'static str, value: String },
}

/// Stretches a password into a fixed-size key.
///
/// Deterministic in all three inputs; every caller that compares hashes
/// must come through here with the parameters stored alongside the hash.
pub fn derive_hash(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

/// A complete admin credential record: salt, derived hash, iteration count.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    salt: Vec<u8>,
    hash: [u8; HASH_LEN],
    iterations: u32,
}

impl AdminCredentials {
    /// Derives a fresh record from a password, with a new random salt and
    /// the current default iteration count.
    pub fn generate(password: &str) -> anyhow::Result<Self> {
        let mut salt = vec![0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .context("failed to read entropy for the salt")?;
        let hash = derive_hash(password.as_bytes(), &salt, DEFAULT_ITERATIONS);
        Ok(Self {
            salt,
            hash,
            iterations: DEFAULT_ITERATIONS,
        })
    }

    /// Checks a password against the stored hash in constant time.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = derive_hash(password.as_bytes(), &self.salt, self.iterations);
        candidate.ct_eq(&self.hash).into()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Reads a record out of an already-parsed settings file. A missing
    /// iteration count falls back to the default; anything malformed is a
    /// configuration error, never a silent mismatch.
    pub fn from_settings(settings: &SettingsFile) -> Result<Self, CredentialsError> {
        let path = settings.path().display().to_string();
        let salt = decode_hex_key(settings, &path, KEY_SALT, SALT_LEN)?;
        let hash_bytes = decode_hex_key(settings, &path, KEY_HASH, HASH_LEN)?;
        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&hash_bytes);
        let iterations = match settings.get(KEY_ITERATIONS) {
            None => DEFAULT_ITERATIONS,
            Some(raw) => parse_iterations(raw)?,
        };
        Ok(Self {
            salt,
            hash,
            iterations,
        })
    }

    /// Reads a record from the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let settings = SettingsFile::read(path).map_err(|err| {
            let path = path.display().to_string();
            if err.kind() == io::ErrorKind::NotFound {
                CredentialsError::FileMissing { path }
            } else {
                CredentialsError::Io { path, source: err }
            }
        })?;
        Self::from_settings(&settings)
    }

    /// Writes the record into a settings file, leaving unrelated keys
    /// alone. The caller decides when to save.
    pub fn store(&self, settings: &mut SettingsFile) {
        settings.set(KEY_SALT, &hex::encode(&self.salt));
        settings.set(KEY_HASH, &hex::encode(self.hash));
        settings.set(KEY_ITERATIONS, &self.iterations.to_string());
    }
}

fn decode_hex_key(
    settings: &SettingsFile,
    path: &str,
    key: &'static str,
    expected: usize,
) -> Result<Vec<u8>, CredentialsError> {
    let raw = settings.get(key).ok_or(CredentialsError::KeyMissing {
        key,
        path: path.to_string(),
    })?;
    let bytes = hex::decode(raw).map_err(|_| CredentialsError::InvalidHex { key })?;
    if bytes.len() != expected {
        return Err(CredentialsError::InvalidLength {
            key,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

fn parse_iterations(raw: &str) -> Result<u32, CredentialsError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CredentialsError::InvalidIterations {
            key: KEY_ITERATIONS,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_hash(b"hunter2", b"0123456789abcdef", 1_000);
        let b = derive_hash(b"hunter2", b"0123456789abcdef", 1_000);
        assert_eq!(a, b);
        assert_ne!(a, derive_hash(b"hunter2", b"fedcba9876543210", 1_000));
        assert_ne!(a, derive_hash(b"hunter2", b"0123456789abcdef", 1_001));
    }

    #[test]
    fn derivation_matches_known_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1), the published vector.
        let out = derive_hash(b"password", b"salt", 1);
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn generate_and_verify() {
        let creds = AdminCredentials::generate("correct horse").unwrap();
        assert_eq!(creds.iterations(), DEFAULT_ITERATIONS);
        assert!(creds.verify("correct horse"));
        assert!(!creds.verify("battery staple"));
        assert!(!creds.verify(""));
    }

    #[test]
    fn generate_uses_a_fresh_salt_each_time() {
        let mut a = SettingsFile::new(".env");
        let mut b = SettingsFile::new(".env");
        AdminCredentials::generate("same password")
            .unwrap()
            .store(&mut a);
        AdminCredentials::generate("same password")
            .unwrap()
            .store(&mut b);
        assert_ne!(a.get(KEY_SALT), b.get(KEY_SALT));
        assert_ne!(a.get(KEY_HASH), b.get(KEY_HASH));
    }

    #[test]
    fn store_and_load_roundtrip() {
        let mut settings = SettingsFile::new(".env");
        settings.set("UNRELATED", "kept");
        AdminCredentials::generate("swordfish")
            .unwrap()
            .store(&mut settings);

        let reloaded = AdminCredentials::from_settings(&settings).unwrap();
        assert!(reloaded.verify("swordfish"));
        assert!(!reloaded.verify("sword fish"));
        assert_eq!(settings.get("UNRELATED"), Some("kept"));
    }

    #[test]
    fn missing_keys_are_reported_by_name() {
        let empty = SettingsFile::new(".env");
        match AdminCredentials::from_settings(&empty) {
            Err(CredentialsError::KeyMissing { key, .. }) => assert_eq!(key, KEY_SALT),
            other => panic!("expected missing salt, got {other:?}"),
        }

        let mut partial = SettingsFile::new(".env");
        partial.set(KEY_SALT, &hex::encode([7u8; SALT_LEN]));
        match AdminCredentials::from_settings(&partial) {
            Err(CredentialsError::KeyMissing { key, .. }) => assert_eq!(key, KEY_HASH),
            other => panic!("expected missing hash, got {other:?}"),
        }
    }

    #[test]
    fn missing_iterations_falls_back_to_default() {
        let mut settings = SettingsFile::new(".env");
        let salt = [3u8; SALT_LEN];
        let hash = derive_hash(b"opensesame", &salt, DEFAULT_ITERATIONS);
        settings.set(KEY_SALT, &hex::encode(salt));
        settings.set(KEY_HASH, &hex::encode(hash));

        let creds = AdminCredentials::from_settings(&settings).unwrap();
        assert_eq!(creds.iterations(), DEFAULT_ITERATIONS);
        assert!(creds.verify("opensesame"));
    }

    #[test]
    fn malformed_records_are_configuration_errors() {
        let mut settings = SettingsFile::new(".env");
        settings.set(KEY_SALT, "not hex at all");
        settings.set(KEY_HASH, &hex::encode([0u8; HASH_LEN]));
        assert!(matches!(
            AdminCredentials::from_settings(&settings),
            Err(CredentialsError::InvalidHex { key: KEY_SALT })
        ));

        let mut short = SettingsFile::new(".env");
        short.set(KEY_SALT, &hex::encode([1u8; 4]));
        short.set(KEY_HASH, &hex::encode([0u8; HASH_LEN]));
        assert!(matches!(
            AdminCredentials::from_settings(&short),
            Err(CredentialsError::InvalidLength {
                key: KEY_SALT,
                expected: SALT_LEN,
                actual: 4,
            })
        ));

        for bad_iter in ["0", "-5", "lots", "20.5"] {
            let mut settings = SettingsFile::new(".env");
            settings.set(KEY_SALT, &hex::encode([2u8; SALT_LEN]));
            settings.set(KEY_HASH, &hex::encode([0u8; HASH_LEN]));
            settings.set(KEY_ITERATIONS, bad_iter);
            assert!(
                matches!(
                    AdminCredentials::from_settings(&settings),
                    Err(CredentialsError::InvalidIterations { .. })
                ),
                "ADMIN_ITER={bad_iter} should be rejected"
            );
        }
    }

    #[test]
    fn load_names_the_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.env");
        match AdminCredentials::load(&path) {
            Err(CredentialsError::FileMissing { path: reported }) => {
                assert!(reported.contains("nope.env"));
            }
            other => panic!("expected a missing-file error, got {other:?}"),
        }
    }
}
