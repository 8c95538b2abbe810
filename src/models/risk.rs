use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "risk_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Technological,
    Operational,
    Legal,
    Financial,
    Reputational,
}

/// Severity scale shared by impact, probability and the derived risk level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type, Serialize, Deserialize,
)]
#[sqlx(type_name = "risk_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn weight(self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    /// Risk level for an impact/probability pair, bucketed from their product (1..=16).
    pub fn risk_level(impact: Severity, probability: Severity) -> Severity {
        match impact.weight() * probability.weight() {
            12.. => Severity::Critical,
            6..=11 => Severity::High,
            3..=5 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "risk_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Open,
    InProgress,
    Mitigated,
    Accepted,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "open",
            RiskStatus::InProgress => "in_progress",
            RiskStatus::Mitigated => "mitigated",
            RiskStatus::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Risk {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: RiskCategory,
    pub impact: Severity,
    pub probability: Severity,
    pub risk_level: Severity,
    pub status: RiskStatus,
    pub owner_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskCreate {
    pub title: String,
    pub description: Option<String>,
    pub category: RiskCategory,
    pub impact: Severity,
    pub probability: Severity,
    pub status: Option<RiskStatus>,
    pub owner_id: Option<Uuid>,
}

/// Partial edit of a risk. Absent fields are left untouched; `description`
/// and `owner_id` may be sent as `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub category: Option<RiskCategory>,
    pub impact: Option<Severity>,
    pub probability: Option<Severity>,
    pub status: Option<RiskStatus>,
    #[serde(default, deserialize_with = "present")]
    pub owner_id: Option<Option<Uuid>>,
}

/// Marks a field that appeared in the body, even as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl RiskUpdate {
    pub fn changes_owner(&self, current: Option<Uuid>) -> bool {
        matches!(self.owner_id, Some(owner) if owner != current)
    }
}

/// Columns written by the repository on update. `None` keeps the stored
/// value, so concurrent writers only overwrite what the caller supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<RiskCategory>,
    pub impact: Option<Severity>,
    pub probability: Option<Severity>,
    pub risk_level: Option<Severity>,
    pub status: Option<RiskStatus>,
    pub owner_id: Option<Option<Uuid>>,
}

impl RiskChanges {
    /// Impact, probability and level are written together whenever either
    /// factor changes, so the stored level always matches its factors.
    pub fn from_update(risk: &Risk, update: RiskUpdate) -> Self {
        let (impact, probability, risk_level) =
            if update.impact.is_some() || update.probability.is_some() {
                let impact = update.impact.unwrap_or(risk.impact);
                let probability = update.probability.unwrap_or(risk.probability);
                (
                    Some(impact),
                    Some(probability),
                    Some(Severity::risk_level(impact, probability)),
                )
            } else {
                (None, None, None)
            };

        Self {
            title: update.title,
            description: update.description,
            category: update.category,
            impact,
            probability,
            risk_level,
            status: update.status,
            owner_id: update.owner_id,
        }
    }

    /// Apply these changes to an in-memory row.
    pub fn apply(&self, risk: &mut Risk) {
        if let Some(title) = &self.title {
            risk.title = title.clone();
        }
        if let Some(description) = &self.description {
            risk.description = description.clone();
        }
        if let Some(category) = self.category {
            risk.category = category;
        }
        if let Some(impact) = self.impact {
            risk.impact = impact;
        }
        if let Some(probability) = self.probability {
            risk.probability = probability;
        }
        if let Some(level) = self.risk_level {
            risk.risk_level = level;
        }
        if let Some(status) = self.status {
            risk.status = status;
        }
        if let Some(owner_id) = self.owner_id {
            risk.owner_id = owner_id;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskFilter {
    pub status: Option<RiskStatus>,
    pub category: Option<RiskCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_risk() -> Risk {
        Risk {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Unpatched VPN appliance".to_string(),
            description: None,
            category: RiskCategory::Technological,
            impact: Severity::High,
            probability: Severity::Medium,
            risk_level: Severity::High,
            status: RiskStatus::Open,
            owner_id: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_risk_level_buckets() {
        assert_eq!(Severity::risk_level(Severity::Low, Severity::Low), Severity::Low);
        assert_eq!(Severity::risk_level(Severity::Low, Severity::Medium), Severity::Low);
        assert_eq!(Severity::risk_level(Severity::Low, Severity::High), Severity::Medium);
        assert_eq!(Severity::risk_level(Severity::Medium, Severity::Medium), Severity::Medium);
        assert_eq!(Severity::risk_level(Severity::Medium, Severity::High), Severity::High);
        assert_eq!(Severity::risk_level(Severity::High, Severity::High), Severity::High);
        assert_eq!(
            Severity::risk_level(Severity::High, Severity::Critical),
            Severity::Critical
        );
        assert_eq!(
            Severity::risk_level(Severity::Critical, Severity::Critical),
            Severity::Critical
        );
    }

    #[test]
    fn test_unknown_enum_values_are_rejected() {
        let body =
            r#"{"title":"x","category":"technological","impact":"extreme","probability":"low"}"#;
        assert!(serde_json::from_str::<RiskCreate>(body).is_err());

        let body = r#"{"status":"closed"}"#;
        assert!(serde_json::from_str::<RiskUpdate>(body).is_err());
    }

    #[test]
    fn test_changes_recompute_level_from_both_factors() {
        let risk = sample_risk();
        let changes = RiskChanges::from_update(
            &risk,
            RiskUpdate {
                probability: Some(Severity::Critical),
                ..Default::default()
            },
        );
        assert_eq!(changes.impact, Some(Severity::High));
        assert_eq!(changes.probability, Some(Severity::Critical));
        assert_eq!(changes.risk_level, Some(Severity::Critical));
        assert_eq!(changes.title, None);
        assert_eq!(changes.status, None);
    }

    #[test]
    fn test_title_edit_leaves_status_and_owner_unwritten() {
        let risk = sample_risk();
        let changes = RiskChanges::from_update(
            &risk,
            RiskUpdate {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            changes,
            RiskChanges {
                title: Some("Renamed".to_string()),
                ..Default::default()
            }
        );

        // A decision committed after the edit was prepared survives it.
        let mut stored = risk.clone();
        stored.status = RiskStatus::Accepted;
        changes.apply(&mut stored);
        assert_eq!(stored.status, RiskStatus::Accepted);
        assert_eq!(stored.title, "Renamed");
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let cleared: RiskUpdate =
            serde_json::from_str(r#"{"description":null,"owner_id":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.owner_id, Some(None));

        let untouched: RiskUpdate = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(untouched.description, None);
        assert_eq!(untouched.owner_id, None);

        let mut risk = sample_risk();
        risk.description = Some("old".to_string());
        risk.owner_id = Some(Uuid::new_v4());
        RiskChanges::from_update(&risk, cleared).apply(&mut risk);
        assert_eq!(risk.description, None);
        assert_eq!(risk.owner_id, None);
    }

    #[test]
    fn test_changes_owner() {
        let owner = Uuid::new_v4();
        let update = RiskUpdate {
            owner_id: Some(Some(owner)),
            ..Default::default()
        };
        assert!(update.changes_owner(None));
        assert!(!update.changes_owner(Some(owner)));
        assert!(!RiskUpdate::default().changes_owner(Some(owner)));

        let unassign = RiskUpdate {
            owner_id: Some(None),
            ..Default::default()
        };
        assert!(unassign.changes_owner(Some(owner)));
        assert!(!unassign.changes_owner(None));
    }
}
