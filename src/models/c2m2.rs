use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Highest Maturity Indicator Level a practice or control can reach.
pub const MAX_MIL: i16 = 3;

/// Width of the `practice_id` column.
pub const MAX_PRACTICE_ID_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "practice_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PracticeStatus {
    NotImplemented,
    PartiallyImplemented,
    FullyImplemented,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct C2M2PracticeEvaluation {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub practice_id: String,
    pub mil_level: i16,
    pub status: PracticeStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeEvaluationInput {
    pub practice_id: String,
    pub mil_level: i16,
    pub status: PracticeStatus,
}

/// Top-level NIST CSF functions, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NistFunction {
    Identify,
    Protect,
    Detect,
    Respond,
    Recover,
    Govern,
}

impl NistFunction {
    pub const ALL: [NistFunction; 6] = [
        NistFunction::Identify,
        NistFunction::Protect,
        NistFunction::Detect,
        NistFunction::Respond,
        NistFunction::Recover,
        NistFunction::Govern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NistFunction::Identify => "Identify",
            NistFunction::Protect => "Protect",
            NistFunction::Detect => "Detect",
            NistFunction::Respond => "Respond",
            NistFunction::Recover => "Recover",
            NistFunction::Govern => "Govern",
        }
    }

    /// Function named by a control family such as `"Identify (ID.AM)"`.
    pub fn from_family(family: &str) -> Option<Self> {
        let name = family
            .split_once(" (")
            .map_or(family, |(prefix, _)| prefix)
            .trim();
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for NistFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMaturitySummary {
    pub function: NistFunction,
    pub achieved_level: i16,
    pub evaluated_controls: i64,
    pub total_controls: i64,
    /// Number of evaluated controls at MIL 0, 1, 2 and 3.
    pub level_distribution: [i64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct C2M2MaturityFrameworkSummaryResponse {
    pub organization_id: Uuid,
    pub framework_id: Uuid,
    pub functions: Vec<FunctionMaturitySummary>,
}
