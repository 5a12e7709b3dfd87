//! ParcelHub Admin library.
//!
//! Courier integrations and fraud screening for the admin panel, exposed
//! as a library so the binary, the CLI and the integration tests share one
//! implementation.
//!
//! # Security
//!
//! This crate holds courier merchant credentials (read from the settings
//! table) and customer phone numbers. Admin routes require the
//! `ADMIN_API_TOKEN` bearer token.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod couriers;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
