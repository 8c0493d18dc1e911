//! Dispatch queue ranking.

use crate::scoring::types::{PriorityQueueItem, RiskAssessment, RiskLevel};

/// Maximum number of vehicles in the dispatch queue.
pub const PRIORITY_QUEUE_LEN: usize = 5;

const SCORE_WEIGHT: f64 = 2.0;
const WORSENING_BONUS: f64 = 3.0;

/// Ranks assessments into the top [`PRIORITY_QUEUE_LEN`] dispatch queue.
pub fn rank<'a, I>(assessments: I) -> Vec<PriorityQueueItem>
where
    I: IntoIterator<Item = &'a RiskAssessment>,
{
    rank_top(assessments, PRIORITY_QUEUE_LEN)
}

/// Ranks assessments by composite priority, descending, keeping `limit`.
///
/// The sort is stable: equal priorities keep their input order.
pub fn rank_top<'a, I>(assessments: I, limit: usize) -> Vec<PriorityQueueItem>
where
    I: IntoIterator<Item = &'a RiskAssessment>,
{
    let mut items: Vec<PriorityQueueItem> = assessments
        .into_iter()
        .map(|a| {
            let minutes = minutes_without_communication(a);
            let worsening = predicted_to_worsen(a);
            PriorityQueueItem {
                assessment: a.clone(),
                rank: 0,
                priority_score: priority_score(a.risk_score, minutes, worsening),
                minutes_without_communication: minutes,
                predicted_to_worsen: worsening,
            }
        })
        .collect();

    items.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
    items.truncate(limit);

    for (i, item) in items.iter_mut().enumerate() {
        item.rank = i + 1;
    }

    items
}

/// `score * 2 + minutes / 60 + 3 if worsening`.
pub fn priority_score(risk_score: u32, minutes_without_communication: i64, worsening: bool) -> f64 {
    let bonus = if worsening { WORSENING_BONUS } else { 0.0 };
    risk_score as f64 * SCORE_WEIGHT + minutes_without_communication as f64 / 60.0 + bonus
}

/// Largest minutes value carried by a stale-communication reason, else 0.
pub fn minutes_without_communication(assessment: &RiskAssessment) -> i64 {
    assessment
        .reasons
        .iter()
        .filter_map(|r| r.stale_minutes())
        .max()
        .unwrap_or(0)
}

pub fn predicted_to_worsen(assessment: &RiskAssessment) -> bool {
    assessment.risk_level == RiskLevel::Critical
        || assessment.reasons.iter().any(|r| r.is_critical_stale())
}
