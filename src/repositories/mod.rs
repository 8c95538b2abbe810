pub mod approval_repo;
pub mod audit_repo;
pub mod risk_repo;
pub mod stakeholder_repo;

pub use approval_repo::{ApprovalRepository, SqlxApprovalRepository};
pub use audit_repo::{AuditRepository, SqlxAuditRepository};
pub use risk_repo::{RiskRepository, SqlxRiskRepository};
pub use stakeholder_repo::{SqlxStakeholderRepository, StakeholderRepository};
