//! ParcelHub Core - Shared types library.
//!
//! This crate provides common types used across all ParcelHub components:
//! - `admin` - Courier integration and fraud screening service
//! - `cli` - Command-line tools for migrations, settings and the blacklist
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, phone numbers, statuses and courier providers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
