//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. `RequireAdminToken` extractor on admin handlers

pub mod auth;

pub use auth::RequireAdminToken;
