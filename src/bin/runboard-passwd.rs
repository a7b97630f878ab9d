//! Interactive credential generator for the admin panel.
//!
//! Prompts for a password twice without echoing, derives a salted PBKDF2
//! record, and writes it into the settings file next to whatever else the
//! file already holds. Nothing touches the filesystem until both prompts
//! succeed.

use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};

use runboard::credentials::AdminCredentials;
use runboard::settings::{SettingsFile, DEFAULT_SETTINGS_PATH};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    println!("Setting the admin password (stored in {DEFAULT_SETTINGS_PATH}).");

    let password =
        rpassword::prompt_password("New admin password: ").context("Failed to read password")?;
    let confirm =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;

    let credentials = set_password(&password, &confirm, Path::new(DEFAULT_SETTINGS_PATH))?;

    println!("Admin credential record written to {DEFAULT_SETTINGS_PATH}.");
    println!(
        "  PBKDF2-HMAC-SHA256, {} iterations",
        credentials.iterations()
    );
    println!("Keep this file out of version control.");

    Ok(())
}

/// Validate the two password entries and rewrite the settings file with a
/// fresh credential record. Rejected input returns an error before anything
/// is read or written, so the file is never left half-updated.
fn set_password(password: &str, confirm: &str, path: &Path) -> Result<AdminCredentials> {
    if password.is_empty() {
        bail!("no password entered, nothing was written");
    }
    if password != confirm {
        bail!("passwords did not match, nothing was written");
    }

    let credentials = AdminCredentials::generate(password)?;

    let mut settings = SettingsFile::read_or_new(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    credentials.store(&mut settings);
    settings
        .save()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_password_leaves_settings_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        fs::write(&path, "DATABASE_URL=postgres://localhost/leaderboard\n").unwrap();

        let err = set_password("", "", &path).unwrap_err();
        assert!(err.to_string().contains("no password entered"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "DATABASE_URL=postgres://localhost/leaderboard\n"
        );
    }

    #[test]
    fn test_mismatched_confirmation_leaves_settings_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        fs::write(&path, "SECRET_FLAG=keep\n").unwrap();

        let err = set_password("abc", "abd", &path).unwrap_err();
        assert!(err.to_string().contains("did not match"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "SECRET_FLAG=keep\n");
    }

    #[test]
    fn test_matching_passwords_write_a_record() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");

        let credentials = set_password("correct-horse", "correct-horse", &path).unwrap();
        assert!(credentials.verify("correct-horse"));
        assert!(!credentials.verify("wrong-horse"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("ADMIN_SALT="));
        assert!(written.contains("ADMIN_HASH="));
        assert!(written.contains("ADMIN_ITER=200000"));
    }
}
