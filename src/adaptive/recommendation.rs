use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;
use uuid::Uuid;

use crate::adaptive::config::{AdaptiveConfig, EmotionalFitParams, RecommendationParams};
use crate::adaptive::error::{AdaptiveError, AdaptiveResult};
use crate::adaptive::types::{
    CatalogItem, ContentType, EmotionalStateSummary, LearnerHistory, RankedFactor, ReasonCode,
    Recommendation, RecommendationContext,
};

const MS_PER_HOUR: f64 = 3_600_000.0;
const LEVEL_STEP_PENALTY: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    pub value: f64,
    pub explanation: String,
}

impl FactorScore {
    fn new(value: f64, explanation: impl Into<String>) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            explanation: explanation.into(),
        }
    }
}

/// One named signal in a candidate's score. Returning `None` means the factor
/// has no data for this candidate and is left out of its weight normalization.
pub trait ScoringFactor: Send + Sync {
    fn name(&self) -> &'static str;
    fn reason_code(&self) -> ReasonCode;
    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore>;
}

pub struct TopicAffinity;

impl ScoringFactor for TopicAffinity {
    fn name(&self) -> &'static str {
        "topic_affinity"
    }

    fn reason_code(&self) -> ReasonCode {
        ReasonCode::Interests
    }

    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore> {
        let interests = normalized_set(&ctx.learner_history.interests);
        let tags = normalized_set(&item.tags);
        if interests.is_empty() || tags.is_empty() {
            return None;
        }

        let shared = interests.intersection(&tags).count();
        let union = interests.union(&tags).count();
        let value = shared as f64 / union as f64;
        let explanation = if shared == 0 {
            "Outside your listed interests".to_string()
        } else {
            format!(
                "Matches {shared} of your interests ({:.0}% overlap)",
                value * 100.0
            )
        };
        Some(FactorScore::new(value, explanation))
    }
}

pub struct DifficultyFit;

impl ScoringFactor for DifficultyFit {
    fn name(&self) -> &'static str {
        "difficulty_fit"
    }

    fn reason_code(&self) -> ReasonCode {
        ReasonCode::Proficiency
    }

    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore> {
        let level = ctx.learner_history.proficiency?;
        let distance = (item.difficulty.rank() - level.rank()).abs();
        let value = (1.0 - LEVEL_STEP_PENALTY * distance as f64).max(0.0);
        let explanation = match item.difficulty.rank().cmp(&level.rank()) {
            Ordering::Equal => format!("Pitched at your {} level", level.as_str()),
            Ordering::Greater => format!(
                "{} content, {distance} level(s) above you",
                item.difficulty.as_str()
            ),
            Ordering::Less => format!(
                "{} content, {distance} level(s) below you",
                item.difficulty.as_str()
            ),
        };
        Some(FactorScore::new(value, explanation))
    }
}

/// Penalizes heavy content under stress and favors light or review content
/// under fatigue.
pub struct EmotionalFit {
    params: EmotionalFitParams,
}

impl EmotionalFit {
    pub fn new(params: EmotionalFitParams) -> Self {
        Self { params }
    }

    pub fn score(&self, item: &CatalogItem, state: &EmotionalStateSummary) -> FactorScore {
        let p = &self.params;
        let load = item.cognitive_load.clamp(0.0, 1.0);
        let comfort_load = 0.25 + 0.5 * state.engagement_index;
        let mut value = 1.0 - (load - comfort_load).abs();
        let mut notes: Vec<&str> = Vec::new();

        if state.stress_index > p.stress_threshold {
            value -= p.stress_penalty * load;
            notes.push("stress is high, so demanding material is held back");
        }

        if state.fatigue_index > p.fatigue_threshold {
            if item.is_review || load <= p.light_load_cutoff {
                value += p.fatigue_bonus;
                notes.push("light or review material suits your current fatigue");
            } else {
                value -= p.fatigue_bonus;
                notes.push("heavy material while you seem tired");
            }
        }

        if state.engagement_index < p.low_engagement_threshold
            && item.content_type == ContentType::Interactive
        {
            value += p.interactive_bonus;
            notes.push("an interactive format can lift engagement");
        }

        let explanation = if notes.is_empty() {
            "Workload fits your current emotional state".to_string()
        } else {
            let joined = notes.join("; ");
            let mut chars = joined.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => joined,
            }
        };
        FactorScore::new(value, explanation)
    }
}

impl ScoringFactor for EmotionalFit {
    fn name(&self) -> &'static str {
        "emotional_fit"
    }

    fn reason_code(&self) -> ReasonCode {
        ReasonCode::EmotionalState
    }

    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore> {
        Some(self.score(item, ctx.emotional_state))
    }
}

pub struct Recency {
    horizon_hours: f64,
}

impl Recency {
    pub fn new(horizon_hours: f64) -> Self {
        Self { horizon_hours }
    }
}

impl ScoringFactor for Recency {
    fn name(&self) -> &'static str {
        "recency"
    }

    fn reason_code(&self) -> ReasonCode {
        ReasonCode::Recency
    }

    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore> {
        let Some(last_seen) = ctx.learner_history.last_seen.get(&item.id) else {
            return Some(FactorScore::new(1.0, "You have not opened this yet"));
        };
        let elapsed_hours = ctx.now_ms.saturating_sub(*last_seen).max(0) as f64 / MS_PER_HOUR;
        let value = (elapsed_hours / self.horizon_hours).min(1.0);
        Some(FactorScore::new(
            value,
            format!("Last opened {elapsed_hours:.0} hour(s) ago"),
        ))
    }
}

pub struct Performance {
    weak_success_rate: f64,
}

impl Performance {
    pub fn new(weak_success_rate: f64) -> Self {
        Self { weak_success_rate }
    }
}

impl ScoringFactor for Performance {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn reason_code(&self) -> ReasonCode {
        ReasonCode::Performance
    }

    fn evaluate(&self, item: &CatalogItem, ctx: &RecommendationContext<'_>) -> Option<FactorScore> {
        let history: &LearnerHistory = ctx.learner_history;
        let (topic, rate) = item
            .tags
            .iter()
            .filter_map(|tag| {
                history
                    .topic_success
                    .iter()
                    .find(|(topic, _)| topic.eq_ignore_ascii_case(tag))
                    .map(|(topic, rate)| (topic.as_str(), rate.clamp(0.0, 1.0)))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))?;

        let explanation = if rate < self.weak_success_rate {
            format!(
                "Reinforces {topic}, where your success rate is {:.0}%",
                rate * 100.0
            )
        } else {
            format!("You are doing well in {topic} ({:.0}%)", rate * 100.0)
        };
        Some(FactorScore::new(1.0 - rate, explanation))
    }
}

struct WeightedFactor {
    factor: Box<dyn ScoringFactor>,
    weight: f64,
}

struct ScoredCandidate {
    item_index: usize,
    confidence: f64,
    reason_code: ReasonCode,
    factors: Vec<RankedFactor>,
}

pub struct RecommendationEngine {
    factors: Vec<WeightedFactor>,
    params: RecommendationParams,
}

impl RecommendationEngine {
    pub fn new(params: RecommendationParams) -> Self {
        Self {
            factors: Vec::new(),
            params,
        }
    }

    pub fn from_config(config: &AdaptiveConfig) -> Self {
        let weights = &config.factors;
        let rec = &config.recommendation;
        Self::new(rec.clone())
            .with_factor(TopicAffinity, weights.topic_affinity)
            .with_factor(DifficultyFit, weights.difficulty_fit)
            .with_factor(
                EmotionalFit::new(config.emotional_fit.clone()),
                weights.emotional_fit,
            )
            .with_factor(Recency::new(rec.recency_horizon_hours), weights.recency)
            .with_factor(Performance::new(rec.weak_success_rate), weights.performance)
    }

    /// Registers a factor; registration order breaks ties between factors.
    pub fn with_factor(mut self, factor: impl ScoringFactor + 'static, weight: f64) -> Self {
        self.factors.push(WeightedFactor {
            factor: Box::new(factor),
            weight: weight.max(0.0),
        });
        self
    }

    pub fn factor_names(&self) -> Vec<&'static str> {
        self.factors.iter().map(|f| f.factor.name()).collect()
    }

    pub fn recommend(&self, ctx: &RecommendationContext<'_>) -> AdaptiveResult<Vec<Recommendation>> {
        let eligible: Vec<(usize, &CatalogItem)> = ctx
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, item)| ctx.learner_history.is_eligible(item))
            .collect();
        if eligible.is_empty() {
            return Err(AdaptiveError::EmptyCatalog);
        }

        let mut scored: Vec<ScoredCandidate> = eligible
            .par_iter()
            .filter_map(|(idx, item)| self.score_candidate(*idx, item, ctx))
            .filter(|c| c.confidence >= self.params.min_confidence_floor)
            .collect();

        // stable: equal scores keep catalog order
        scored.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(self.params.max_results);

        Ok(scored
            .into_iter()
            .map(|c| {
                let item = &ctx.catalog[c.item_index];
                Recommendation {
                    id: Uuid::new_v4().to_string(),
                    content_id: item.id.clone(),
                    kind: item.kind,
                    confidence_score: c.confidence,
                    reason_code: c.reason_code,
                    factors: c.factors,
                }
            })
            .collect())
    }

    fn score_candidate(
        &self,
        item_index: usize,
        item: &CatalogItem,
        ctx: &RecommendationContext<'_>,
    ) -> Option<ScoredCandidate> {
        let evaluated: Vec<(&WeightedFactor, FactorScore)> = self
            .factors
            .iter()
            .filter(|f| f.weight > 0.0)
            .filter_map(|f| f.factor.evaluate(item, ctx).map(|score| (f, score)))
            .collect();

        let total_weight: f64 = evaluated.iter().map(|(f, _)| f.weight).sum();
        if total_weight <= 0.0 {
            return None;
        }

        let mut ranked: Vec<(ReasonCode, RankedFactor)> = evaluated
            .into_iter()
            .map(|(f, score)| {
                (
                    f.factor.reason_code(),
                    RankedFactor {
                        name: f.factor.name().to_string(),
                        weight: f.weight / total_weight,
                        value: score.value,
                        explanation: score.explanation,
                    },
                )
            })
            .collect();

        let confidence = ranked
            .iter()
            .map(|(_, f)| f.weight * f.value)
            .sum::<f64>()
            .clamp(0.0, 1.0);

        ranked.sort_by(|(_, a), (_, b)| {
            (b.weight * b.value)
                .partial_cmp(&(a.weight * a.value))
                .unwrap_or(Ordering::Equal)
        });
        let reason_code = ranked.first().map(|(code, _)| *code)?;

        Some(ScoredCandidate {
            item_index,
            confidence,
            reason_code,
            factors: ranked.into_iter().map(|(_, f)| f).collect(),
        })
    }
}

fn normalized_set(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}
