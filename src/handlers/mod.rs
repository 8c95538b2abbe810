pub mod approval_handlers;
pub mod audit_handlers;
pub mod health_handlers;
pub mod risk_handlers;
pub mod stakeholder_handlers;

pub use health_handlers::{health_check, liveness_check, readiness_check};
