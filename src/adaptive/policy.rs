use crate::adaptive::config::{AdaptationThresholds, AdaptiveConfig, AdviceTable};
use crate::adaptive::types::{
    AdaptationAction, AdaptationAdvice, EmotionalStateSummary, LearnerHistory, Recommendation,
    Trend,
};

pub struct AdaptationPolicy {
    thresholds: AdaptationThresholds,
    advice: AdviceTable,
}

impl AdaptationPolicy {
    pub fn new(thresholds: AdaptationThresholds, advice: AdviceTable) -> Self {
        Self { thresholds, advice }
    }

    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self::new(config.adaptation.clone(), config.advice.clone())
    }

    /// First matching rule wins.
    pub fn decide(
        &self,
        state: &EmotionalStateSummary,
        top_recommendation: Option<&Recommendation>,
    ) -> AdaptationAction {
        self.decide_with_history(state, top_recommendation, None)
    }

    /// Like [`decide`](Self::decide), with the learner's success rates
    /// stepping difficulty once the break and switch-topic rules pass.
    pub fn decide_with_history(
        &self,
        state: &EmotionalStateSummary,
        _top_recommendation: Option<&Recommendation>,
        history: Option<&LearnerHistory>,
    ) -> AdaptationAction {
        let t = &self.thresholds;

        if state.stress_index > t.stress_high || state.fatigue_index > t.fatigue_high {
            return AdaptationAction::SuggestBreak;
        }
        if state.engagement_index < t.engagement_low && state.trend == Trend::Declining {
            return AdaptationAction::SwitchTopic;
        }
        match history.and_then(|h| self.difficulty_step(state, h)) {
            Some(step) if step < 0 => return AdaptationAction::ReduceDifficulty,
            Some(step) if step > 0 => return AdaptationAction::IncreaseDifficulty,
            _ => {}
        }
        if state.stress_index < t.stress_low && state.engagement_index > t.engagement_high {
            AdaptationAction::IncreaseDifficulty
        } else {
            AdaptationAction::Continue
        }
    }

    /// Mean topic success rate, or `None` without any recorded topic.
    pub fn performance_score(history: &LearnerHistory) -> Option<f64> {
        let rates: Vec<f64> = history
            .topic_success
            .values()
            .filter(|rate| rate.is_finite())
            .map(|rate| rate.clamp(0.0, 1.0))
            .collect();
        if rates.is_empty() {
            return None;
        }
        Some(rates.iter().sum::<f64>() / rates.len() as f64)
    }

    /// Difficulty change in levels, within [-1, 1]. Mastery steps up and
    /// struggling steps down; elevated stress subtracts one more step.
    fn difficulty_step(&self, state: &EmotionalStateSummary, history: &LearnerHistory) -> Option<i8> {
        let t = &self.thresholds;
        let score = Self::performance_score(history)?;

        let mut step: i8 = if score > t.mastery_score {
            1
        } else if score < t.struggling_score {
            -1
        } else {
            0
        };
        if state.stress_index > t.difficulty_stress {
            step -= 1;
        }
        Some(step.clamp(-1, 1))
    }

    pub fn advise(
        &self,
        state: &EmotionalStateSummary,
        top_recommendation: Option<&Recommendation>,
        history: Option<&LearnerHistory>,
    ) -> AdaptationAdvice {
        let action = self.decide_with_history(state, top_recommendation, history);
        let message = self
            .advice
            .message_for(state.dominant_emotion, state.stress_index)
            .to_string();

        let break_minutes = match action {
            AdaptationAction::SuggestBreak if state.stress_index > self.thresholds.stress_high => {
                Some(self.thresholds.stress_break_minutes)
            }
            AdaptationAction::SuggestBreak => Some(self.thresholds.fatigue_break_minutes),
            _ => None,
        };

        let suggested_content_id = match action {
            AdaptationAction::SwitchTopic | AdaptationAction::Continue => {
                top_recommendation.map(|rec| rec.content_id.clone())
            }
            _ => None,
        };

        AdaptationAdvice {
            action,
            message,
            break_minutes,
            suggested_content_id,
        }
    }
}
