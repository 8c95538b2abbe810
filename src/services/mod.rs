pub mod approval_service;
pub mod compliance_service;
pub mod maturity;
pub mod notification_service;
pub mod risk_service;
pub mod stakeholder_service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use approval_service::ApprovalService;
pub use compliance_service::{compute_compliance_score, ComplianceService};
pub use notification_service::{
    Notification, NotificationDispatcher, NotificationSink, Notifier, TracingNotificationSink,
    WebhookNotificationSink,
};
pub use risk_service::RiskService;
pub use stakeholder_service::StakeholderService;
