use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Settings,
    database::DatabasePool,
    repositories::{
        ApprovalRepository, AuditRepository, RiskRepository, SqlxApprovalRepository,
        SqlxAuditRepository, SqlxRiskRepository, SqlxStakeholderRepository, StakeholderRepository,
    },
    services::{
        ApprovalService, ComplianceService, NotificationDispatcher, NotificationSink, Notifier,
        RiskService, StakeholderService, TracingNotificationSink, WebhookNotificationSink,
    },
};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: DatabasePool,
    pub risk_service: Arc<RiskService>,
    pub stakeholder_service: Arc<StakeholderService>,
    pub approval_service: Arc<ApprovalService>,
    pub compliance_service: Arc<ComplianceService>,
    pub notifications: Arc<NotificationDispatcher>,
}

impl AppState {
    /// Connect to the database, run migrations and wire every service.
    pub async fn new(config: Settings) -> Result<Self, crate::error::ApiError> {
        let db_pool = crate::database::create_connection_pool(
            &config.database_url,
            config.database_max_connections,
        )
        .await?;
        Self::new_with_pool(config, db_pool).await
    }

    /// Create new application state with existing database pool
    pub async fn new_with_pool(
        config: Settings,
        db_pool: DatabasePool,
    ) -> Result<Self, crate::error::ApiError> {
        let config = Arc::new(config);

        // Create repositories
        let risk_repository: Arc<dyn RiskRepository + Send + Sync> =
            Arc::new(SqlxRiskRepository::new(db_pool.clone()));
        let stakeholder_repository: Arc<dyn StakeholderRepository + Send + Sync> =
            Arc::new(SqlxStakeholderRepository::new(db_pool.clone()));
        let approval_repository: Arc<dyn ApprovalRepository + Send + Sync> =
            Arc::new(SqlxApprovalRepository::new(db_pool.clone()));
        let audit_repository: Arc<dyn AuditRepository + Send + Sync> =
            Arc::new(SqlxAuditRepository::new(db_pool.clone()));

        // Notification sink: webhook when configured, log otherwise
        let sink: Arc<dyn NotificationSink> = match &config.notification_webhook_url {
            Some(url) => {
                tracing::info!(url = %url, "Webhook notifications enabled");
                Arc::new(WebhookNotificationSink::new(
                    url.clone(),
                    Duration::from_secs_f64(config.notification_timeout_seconds),
                )?)
            }
            None => {
                tracing::info!("No notification webhook configured, logging notifications");
                Arc::new(TracingNotificationSink)
            }
        };
        let notifications = Arc::new(NotificationDispatcher::start(
            sink,
            config.notification_queue_capacity,
        ));
        let notifier: Arc<dyn Notifier> = notifications.clone();

        // Create services with dependency injection
        let risk_service = Arc::new(RiskService::new(risk_repository.clone(), notifier.clone()));
        let stakeholder_service = Arc::new(StakeholderService::new(
            risk_repository.clone(),
            stakeholder_repository.clone(),
        ));
        let approval_service = Arc::new(ApprovalService::new(
            risk_repository,
            approval_repository,
            stakeholder_repository,
            notifier.clone(),
        ));
        let compliance_service = Arc::new(ComplianceService::new(audit_repository, notifier));

        Ok(Self {
            config,
            db_pool,
            risk_service,
            stakeholder_service,
            approval_service,
            compliance_service,
            notifications,
        })
    }
}
