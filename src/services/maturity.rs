//! C2M2 maturity aggregation.
//!
//! Levels are cumulative per control: MIL n holds only when MIL n-1 holds and
//! every practice evaluated at level n is fully implemented. A NIST function
//! reports the most frequent level among its evaluated controls, ties going to
//! the higher level.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    AuditAssessment, AuditControl, C2M2PracticeEvaluation, FunctionMaturitySummary, NistFunction,
    PracticeStatus, MAX_MIL,
};

/// Achieved MIL for one control, or `None` when no practice was evaluated.
pub fn control_maturity_level(practices: &[&C2M2PracticeEvaluation]) -> Option<i16> {
    if practices.is_empty() {
        return None;
    }

    let mut achieved = 0;
    for level in 1..=MAX_MIL {
        let mut at_level = practices.iter().filter(|p| p.mil_level == level).peekable();
        if at_level.peek().is_none() {
            break;
        }
        if !at_level.all(|p| p.status == PracticeStatus::FullyImplemented) {
            break;
        }
        achieved = level;
    }

    Some(achieved)
}

/// Mode of a level histogram, preferring the higher level on ties. Empty input yields 0.
pub fn function_maturity_level(distribution: &[i64; 4]) -> i16 {
    let mut best_level = 0i16;
    let mut best_count = 0i64;
    for (level, &count) in distribution.iter().enumerate() {
        if count > 0 && count >= best_count {
            best_level = level as i16;
            best_count = count;
        }
    }
    best_level
}

/// One entry per NIST function, in reporting order.
pub fn summarize(
    controls: &[AuditControl],
    assessments: &[AuditAssessment],
    practices: &[C2M2PracticeEvaluation],
) -> Vec<FunctionMaturitySummary> {
    let assessment_by_control: HashMap<Uuid, Uuid> = assessments
        .iter()
        .map(|a| (a.audit_control_id, a.id))
        .collect();

    let mut practices_by_assessment: HashMap<Uuid, Vec<&C2M2PracticeEvaluation>> = HashMap::new();
    for practice in practices {
        practices_by_assessment
            .entry(practice.assessment_id)
            .or_default()
            .push(practice);
    }

    let mut summaries: Vec<FunctionMaturitySummary> = NistFunction::ALL
        .iter()
        .map(|&function| FunctionMaturitySummary {
            function,
            achieved_level: 0,
            evaluated_controls: 0,
            total_controls: 0,
            level_distribution: [0; 4],
        })
        .collect();

    for control in controls {
        let Some(function) = NistFunction::from_family(&control.family) else {
            tracing::debug!(
                control_code = %control.control_code,
                family = %control.family,
                "control family does not name a NIST function"
            );
            continue;
        };
        let Some(summary) = summaries.iter_mut().find(|s| s.function == function) else {
            continue;
        };

        summary.total_controls += 1;

        let level = assessment_by_control
            .get(&control.id)
            .and_then(|assessment_id| practices_by_assessment.get(assessment_id))
            .and_then(|evaluations| control_maturity_level(evaluations));

        if let Some(level) = level {
            summary.evaluated_controls += 1;
            summary.level_distribution[level as usize] += 1;
        }
    }

    for summary in &mut summaries {
        summary.achieved_level = function_maturity_level(&summary.level_distribution);
    }

    summaries
}
