//! Business logic services for admin.
//!
//! # Services
//!
//! - `assignment` - Bind a courier and tracking code to an order
//! - `fraud` - Blacklist + delivery-reputation fraud screening

pub mod assignment;
pub mod fraud;

pub use assignment::{Assignment, AssignmentError, CourierAssignmentService, generate_tracking_code};
pub use fraud::{
    FraudError, FraudEvaluator, FraudQuery, FraudReason, FraudVerdict, MIN_DELIVERY_RATIO,
    ReputationSource,
};
