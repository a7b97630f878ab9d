//! Checks a password against the stored admin credential record.
//!
//! Exits 0 when the password matches, 2 when it does not, and 1 on any
//! configuration or input problem.

use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};

use runboard::credentials::AdminCredentials;
use runboard::settings::DEFAULT_SETTINGS_PATH;

fn main() {
    match run() {
        Ok(true) => {
            println!("Password OK.");
        }
        Ok(false) => {
            eprintln!("Password incorrect.");
            process::exit(2);
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    let credentials = AdminCredentials::load(Path::new(DEFAULT_SETTINGS_PATH))?;

    let password = rpassword::prompt_password("Enter admin password: ")
        .context("Failed to read password")?;
    if password.is_empty() {
        bail!("no password entered");
    }

    Ok(credentials.verify(&password))
}
