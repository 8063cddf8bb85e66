use std::sync::Arc;
use std::time::Duration;

use crate::adaptive::aggregator::EmotionAggregator;
use crate::adaptive::catalog::{fetch_with_timeout, CatalogSource};
use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::error::AdaptiveResult;
use crate::adaptive::feedback::{FeedbackLedger, FeedbackSummary};
use crate::adaptive::policy::AdaptationPolicy;
use crate::adaptive::recommendation::RecommendationEngine;
use crate::adaptive::store::LearnerWindowStore;
use crate::adaptive::types::*;

pub struct AdaptiveEngine {
    config: Arc<AdaptiveConfig>,
    aggregator: EmotionAggregator,
    recommender: RecommendationEngine,
    policy: AdaptationPolicy,
    windows: Arc<LearnerWindowStore>,
    feedback: FeedbackLedger,
}

impl AdaptiveEngine {
    /// Fails fast on an invalid configuration.
    pub fn new(config: AdaptiveConfig) -> AdaptiveResult<Self> {
        let windows = Arc::new(LearnerWindowStore::new(config.limits.max_learners));
        Self::with_store(config, windows)
    }

    pub fn with_store(config: AdaptiveConfig, windows: Arc<LearnerWindowStore>) -> AdaptiveResult<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: EmotionAggregator::from_config(&config),
            recommender: RecommendationEngine::from_config(&config),
            policy: AdaptationPolicy::from_config(&config),
            feedback: FeedbackLedger::new(
                config.limits.max_issued_per_learner,
                config.limits.max_learners,
            ),
            config: Arc::new(config),
            windows,
        })
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn ingest(&self, learner_id: &str, raw: &RawEmotionEvent) -> AdaptiveResult<EmotionalStateSummary> {
        self.windows
            .with_window(learner_id, |window| self.aggregator.ingest(window, raw))
            .inspect_err(|err| {
                tracing::warn!(learner_id, error = %err, "emotion event dropped");
            })
    }

    pub fn current_state(&self, learner_id: &str) -> Option<EmotionalStateSummary> {
        self.windows.summary(learner_id)
    }

    /// Drops the learner's window and feedback history.
    pub fn reset(&self, learner_id: &str) -> bool {
        let had_feedback = self.feedback.forget(learner_id);
        self.windows.reset(learner_id) || had_feedback
    }

    pub fn tracked_learners(&self) -> usize {
        self.windows.learner_count()
    }

    pub fn recommend(&self, ctx: &RecommendationContext<'_>) -> AdaptiveResult<Vec<Recommendation>> {
        self.recommender.recommend(ctx)
    }

    /// Fetches the catalog within `budget`, ranks it for the learner and
    /// remembers the result for feedback attribution.
    pub async fn recommend_for(
        &self,
        learner_id: &str,
        state: &EmotionalStateSummary,
        history: &LearnerHistory,
        catalog: &dyn CatalogSource,
        budget: Duration,
    ) -> AdaptiveResult<Vec<Recommendation>> {
        let items = fetch_with_timeout(catalog, budget).await?;
        let ctx = RecommendationContext {
            emotional_state: state,
            learner_history: history,
            catalog: &items,
            now_ms: chrono::Utc::now().timestamp_millis(),
        };
        let recommendations = self.recommender.recommend(&ctx)?;
        self.feedback.record_issued(learner_id, &recommendations);
        tracing::debug!(
            learner_id,
            candidates = items.len(),
            returned = recommendations.len(),
            "recommendations ranked"
        );
        Ok(recommendations)
    }

    pub fn decide(
        &self,
        state: &EmotionalStateSummary,
        top_recommendation: Option<&Recommendation>,
    ) -> AdaptationAction {
        self.policy.decide(state, top_recommendation)
    }

    pub fn advise(
        &self,
        state: &EmotionalStateSummary,
        top_recommendation: Option<&Recommendation>,
        history: Option<&LearnerHistory>,
    ) -> AdaptationAdvice {
        self.policy.advise(state, top_recommendation, history)
    }

    /// Ingest, recommend and advise in one step. Invalid events are returned
    /// as errors; recommendation failures degrade to an empty list so the
    /// learner's session is never blocked. `degraded` is set only on such a
    /// failure, not when ranking simply returns nothing.
    pub async fn session_update(
        &self,
        learner_id: &str,
        raw: &RawEmotionEvent,
        history: &LearnerHistory,
        catalog: &dyn CatalogSource,
        budget: Duration,
    ) -> AdaptiveResult<SessionUpdate> {
        let state = self.ingest(learner_id, raw)?;

        match self
            .recommend_for(learner_id, &state, history, catalog, budget)
            .await
        {
            Ok(recommendations) => {
                let advice = self
                    .policy
                    .advise(&state, recommendations.first(), Some(history));
                Ok(SessionUpdate {
                    state,
                    recommendations,
                    advice,
                    degraded: false,
                })
            }
            Err(err) => {
                tracing::warn!(learner_id, error = %err, "session update degraded");
                // no switch-topic target without recommendations
                let advice = self.policy.advise(&state, None, Some(history));
                Ok(SessionUpdate {
                    state,
                    recommendations: Vec::new(),
                    advice,
                    degraded: true,
                })
            }
        }
    }

    pub fn record_feedback(&self, learner_id: &str, feedback: Feedback) -> AdaptiveResult<ReasonCode> {
        self.feedback.record_feedback(learner_id, feedback)
    }

    pub fn feedback_summary(&self, learner_id: &str) -> FeedbackSummary {
        self.feedback.summary(learner_id)
    }

    pub fn feedback_learners(&self) -> usize {
        self.feedback.learner_count()
    }
}
