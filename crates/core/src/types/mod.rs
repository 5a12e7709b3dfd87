//! Core types for ParcelHub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod courier;
pub mod id;
pub mod phone;
pub mod status;

pub use courier::{CourierProvider, UnknownProvider};
pub use id::*;
pub use phone::{Phone, PhoneError};
pub use status::*;
