use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;

use crate::adaptive::error::{AdaptiveError, AdaptiveResult};
use crate::adaptive::types::{Feedback, ReasonCode, Recommendation};

const DEFAULT_MAX_ISSUED: usize = 200;
const DEFAULT_MAX_LEARNERS: usize = 10_000;

#[derive(Debug, Clone)]
struct IssuedRecommendation {
    id: String,
    reason_code: ReasonCode,
    feedback: Option<Feedback>,
}

#[derive(Debug, Default)]
struct LearnerLedger {
    queue: VecDeque<IssuedRecommendation>,
    last_access: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonFeedbackStats {
    pub helpful: u32,
    pub not_helpful: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub issued: usize,
    pub rated: usize,
    pub by_reason: HashMap<String, ReasonFeedbackStats>,
}

/// Remembers recently issued recommendations per learner so feedback can be
/// attributed to the reason that produced them. Feeding these counts back
/// into factor weights is left to an offline tuner. At most `max_learners`
/// ledgers are kept; the least recently active one is dropped first.
pub struct FeedbackLedger {
    issued: RwLock<HashMap<String, LearnerLedger>>,
    max_issued: usize,
    max_learners: usize,
    clock: AtomicU64,
}

impl Default for FeedbackLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ISSUED, DEFAULT_MAX_LEARNERS)
    }
}

impl FeedbackLedger {
    pub fn new(max_issued: usize, max_learners: usize) -> Self {
        Self {
            issued: RwLock::new(HashMap::new()),
            max_issued: max_issued.max(1),
            max_learners: max_learners.max(1),
            clock: AtomicU64::new(0),
        }
    }

    pub fn record_issued(&self, learner_id: &str, recommendations: &[Recommendation]) {
        if recommendations.is_empty() {
            return;
        }
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        let mut issued = self.issued.write();
        if !issued.contains_key(learner_id) && issued.len() >= self.max_learners {
            let idlest = issued
                .iter()
                .min_by_key(|(_, ledger)| ledger.last_access)
                .map(|(id, _)| id.clone());
            if let Some(idlest) = idlest {
                issued.remove(&idlest);
            }
        }

        let ledger = issued.entry(learner_id.to_string()).or_default();
        ledger.last_access = tick;
        for rec in recommendations {
            ledger.queue.push_back(IssuedRecommendation {
                id: rec.id.clone(),
                reason_code: rec.reason_code,
                feedback: None,
            });
        }
        while ledger.queue.len() > self.max_issued {
            ledger.queue.pop_front();
        }
    }

    /// Drops everything remembered for the learner.
    pub fn forget(&self, learner_id: &str) -> bool {
        self.issued.write().remove(learner_id).is_some()
    }

    pub fn learner_count(&self) -> usize {
        self.issued.read().len()
    }

    /// Latest feedback for a recommendation replaces any earlier one.
    pub fn record_feedback(&self, learner_id: &str, feedback: Feedback) -> AdaptiveResult<ReasonCode> {
        let tick = self.clock.fetch_add(1, Ordering::Relaxed);
        let mut issued = self.issued.write();
        let ledger = issued
            .get_mut(learner_id)
            .ok_or_else(|| AdaptiveError::UnknownRecommendation(feedback.recommendation_id.clone()))?;
        ledger.last_access = tick;
        let entry = ledger
            .queue
            .iter_mut()
            .find(|r| r.id == feedback.recommendation_id)
            .ok_or_else(|| AdaptiveError::UnknownRecommendation(feedback.recommendation_id.clone()))?;

        tracing::debug!(
            learner_id,
            recommendation_id = %feedback.recommendation_id,
            helpful = feedback.helpful,
            "recommendation feedback recorded"
        );
        entry.feedback = Some(feedback);
        Ok(entry.reason_code)
    }

    pub fn summary(&self, learner_id: &str) -> FeedbackSummary {
        let issued = self.issued.read();
        let Some(queue) = issued.get(learner_id).map(|ledger| &ledger.queue) else {
            return FeedbackSummary::default();
        };

        let mut summary = FeedbackSummary {
            issued: queue.len(),
            ..Default::default()
        };
        for rec in queue {
            let Some(feedback) = rec.feedback.as_ref() else {
                continue;
            };
            summary.rated += 1;
            let stats = summary
                .by_reason
                .entry(rec.reason_code.as_str().to_string())
                .or_default();
            if feedback.helpful {
                stats.helpful += 1;
            } else {
                stats.not_helpful += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::types::ContentKind;

    fn rec(id: &str, reason_code: ReasonCode) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            content_id: format!("content-{id}"),
            kind: ContentKind::Content,
            confidence_score: 0.5,
            reason_code,
            factors: vec![],
        }
    }

    fn feedback(id: &str, helpful: bool) -> Feedback {
        Feedback {
            recommendation_id: id.to_string(),
            helpful,
            reason: None,
        }
    }

    #[test]
    fn feedback_for_unknown_recommendation_is_rejected() {
        let ledger = FeedbackLedger::default();
        let err = ledger.record_feedback("u1", feedback("missing", true)).unwrap_err();
        assert!(matches!(err, AdaptiveError::UnknownRecommendation(_)));
    }

    #[test]
    fn feedback_is_scoped_to_the_learner() {
        let ledger = FeedbackLedger::default();
        ledger.record_issued("u1", &[rec("r1", ReasonCode::Interests)]);
        assert!(ledger.record_feedback("u2", feedback("r1", true)).is_err());
        assert_eq!(
            ledger.record_feedback("u1", feedback("r1", true)).unwrap(),
            ReasonCode::Interests
        );
    }

    #[test]
    fn summary_counts_by_reason() {
        let ledger = FeedbackLedger::default();
        ledger.record_issued(
            "u1",
            &[
                rec("r1", ReasonCode::Interests),
                rec("r2", ReasonCode::EmotionalState),
                rec("r3", ReasonCode::EmotionalState),
            ],
        );
        ledger.record_feedback("u1", feedback("r2", true)).unwrap();
        ledger.record_feedback("u1", feedback("r3", false)).unwrap();
        ledger.record_feedback("u1", feedback("r3", true)).unwrap();

        let summary = ledger.summary("u1");
        assert_eq!(summary.issued, 3);
        assert_eq!(summary.rated, 2);
        let stats = &summary.by_reason["emotional_state"];
        assert_eq!(stats.helpful, 2);
        assert_eq!(stats.not_helpful, 0);
    }

    #[test]
    fn oldest_issued_entries_are_dropped() {
        let ledger = FeedbackLedger::new(2, 10);
        ledger.record_issued(
            "u1",
            &[
                rec("r1", ReasonCode::Recency),
                rec("r2", ReasonCode::Recency),
                rec("r3", ReasonCode::Recency),
            ],
        );
        assert!(ledger.record_feedback("u1", feedback("r1", true)).is_err());
        assert!(ledger.record_feedback("u1", feedback("r3", true)).is_ok());
    }

    #[test]
    fn ledger_keeps_at_most_max_learners() {
        let ledger = FeedbackLedger::new(10, 2);
        ledger.record_issued("u1", &[rec("r1", ReasonCode::Recency)]);
        ledger.record_issued("u2", &[rec("r2", ReasonCode::Recency)]);
        ledger.record_feedback("u1", feedback("r1", true)).unwrap();

        ledger.record_issued("u3", &[rec("r3", ReasonCode::Recency)]);
        assert_eq!(ledger.learner_count(), 2);
        assert_eq!(ledger.summary("u2").issued, 0);
        assert_eq!(ledger.summary("u1").rated, 1);

        for i in 4..40 {
            ledger.record_issued(&format!("u{i}"), &[rec(&format!("r{i}"), ReasonCode::Recency)]);
        }
        assert_eq!(ledger.learner_count(), 2);
    }

    #[test]
    fn forgotten_learner_has_no_feedback_history() {
        let ledger = FeedbackLedger::default();
        ledger.record_issued("u1", &[rec("r1", ReasonCode::Interests)]);
        assert!(ledger.forget("u1"));
        assert_eq!(ledger.learner_count(), 0);
        assert!(ledger.record_feedback("u1", feedback("r1", true)).is_err());
        assert!(!ledger.forget("u1"));
    }
}
