//! # Loyalty server
//! This crate hosts the process that keeps the loyalty database in sync with the accrual service. It is responsible
//! for:
//! * Bringing the database schema up to date on start-up.
//! * Running the accrual synchronizer: every order that has not reached a final status is polled at the accrual
//!   service until it has, and the points it earns are credited to its owner.
//! * Stopping cleanly on Ctrl-C, so that results already collected from the accrual service are written before the
//!   process exits.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod daemon;
pub mod errors;
