//! Run leaderboard server library
//!
//! This library provides the core functionality for the runboard daemon and
//! the credential utilities. Binary entry points are in main.rs and src/bin/.

pub mod admin;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod routes;
pub mod runs;
pub mod server;
pub mod settings;
mod sql;
pub mod state;
pub mod templates;
pub mod users;
