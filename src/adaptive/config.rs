use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adaptive::error::{AdaptiveError, AdaptiveResult};
use crate::adaptive::types::EmotionLabel;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub max_events: usize,
    /// Events older than the newest event by more than this are evicted.
    pub max_age_ms: Option<i64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_events: 20,
            max_age_ms: Some(5 * 60 * 1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EmotionWeights {
    pub stress: f64,
    pub engagement: f64,
    pub fatigue: f64,
}

impl EmotionWeights {
    const fn new(stress: f64, engagement: f64, fatigue: f64) -> Self {
        Self {
            stress,
            engagement,
            fatigue,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionWeightTable {
    pub weights: BTreeMap<EmotionLabel, EmotionWeights>,
    /// Label substituted for unrecognized classifier output.
    pub fallback_label: EmotionLabel,
    /// Reject unrecognized labels instead of substituting the fallback.
    pub strict_labels: bool,
}

impl Default for EmotionWeightTable {
    fn default() -> Self {
        let weights = [
            (EmotionLabel::Happy, EmotionWeights::new(0.0, 0.8, 0.0)),
            (EmotionLabel::Sad, EmotionWeights::new(0.0, 0.3, 0.5)),
            (EmotionLabel::Angry, EmotionWeights::new(0.8, 0.3, 0.0)),
            (EmotionLabel::Neutral, EmotionWeights::new(0.0, 0.3, 0.4)),
            (EmotionLabel::Surprised, EmotionWeights::new(0.0, 0.7, 0.0)),
            (EmotionLabel::Fearful, EmotionWeights::new(0.7, 0.3, 0.0)),
            (EmotionLabel::Disgusted, EmotionWeights::new(0.0, 0.3, 0.0)),
            (EmotionLabel::Tired, EmotionWeights::new(0.0, 0.3, 0.8)),
            (EmotionLabel::Focused, EmotionWeights::new(0.0, 0.9, 0.0)),
            (EmotionLabel::Confused, EmotionWeights::new(0.6, 0.3, 0.0)),
        ]
        .into_iter()
        .collect();

        Self {
            weights,
            fallback_label: EmotionLabel::Neutral,
            strict_labels: false,
        }
    }
}

impl EmotionWeightTable {
    pub fn get(&self, label: EmotionLabel) -> EmotionWeights {
        self.weights
            .get(&label)
            .or_else(|| self.weights.get(&self.fallback_label))
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendThresholds {
    /// Minimum change of a single index between consecutive windows.
    pub threshold: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub topic_affinity: f64,
    pub difficulty_fit: f64,
    pub emotional_fit: f64,
    pub recency: f64,
    pub performance: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            topic_affinity: 0.30,
            difficulty_fit: 0.20,
            emotional_fit: 0.30,
            recency: 0.10,
            performance: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn as_pairs(&self) -> [(&'static str, f64); 5] {
        [
            ("topic_affinity", self.topic_affinity),
            ("difficulty_fit", self.difficulty_fit),
            ("emotional_fit", self.emotional_fit),
            ("recency", self.recency),
            ("performance", self.performance),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalFitParams {
    pub stress_threshold: f64,
    pub stress_penalty: f64,
    pub fatigue_threshold: f64,
    pub fatigue_bonus: f64,
    /// Items at or below this cognitive load count as light.
    pub light_load_cutoff: f64,
    pub low_engagement_threshold: f64,
    pub interactive_bonus: f64,
}

impl Default for EmotionalFitParams {
    fn default() -> Self {
        Self {
            stress_threshold: 0.7,
            stress_penalty: 0.6,
            fatigue_threshold: 0.6,
            fatigue_bonus: 0.3,
            light_load_cutoff: 0.4,
            low_engagement_threshold: 0.4,
            interactive_bonus: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationParams {
    pub min_confidence_floor: f64,
    pub max_results: usize,
    pub recency_horizon_hours: f64,
    pub weak_success_rate: f64,
}

impl Default for RecommendationParams {
    fn default() -> Self {
        Self {
            min_confidence_floor: 0.2,
            max_results: 5,
            recency_horizon_hours: 72.0,
            weak_success_rate: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationThresholds {
    pub stress_high: f64,
    pub fatigue_high: f64,
    pub engagement_low: f64,
    pub stress_low: f64,
    pub engagement_high: f64,
    pub stress_break_minutes: u32,
    pub fatigue_break_minutes: u32,
    /// Mean topic success above which difficulty steps up.
    pub mastery_score: f64,
    /// Mean topic success below which difficulty steps down.
    pub struggling_score: f64,
    /// Stress above this takes one extra difficulty step down.
    pub difficulty_stress: f64,
}

impl Default for AdaptationThresholds {
    fn default() -> Self {
        Self {
            stress_high: 0.7,
            fatigue_high: 0.7,
            engagement_low: 0.3,
            stress_low: 0.3,
            engagement_high: 0.7,
            stress_break_minutes: 15,
            fatigue_break_minutes: 10,
            mastery_score: 0.85,
            struggling_score: 0.5,
            difficulty_stress: 0.5,
        }
    }
}

/// Caps on per-learner state held in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerLimits {
    /// Least recently active learners are evicted beyond this.
    pub max_learners: usize,
    pub max_issued_per_learner: usize,
}

impl Default for LearnerLimits {
    fn default() -> Self {
        Self {
            max_learners: 10_000,
            max_issued_per_learner: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceMessages {
    pub calm: String,
    pub stressed: String,
}

impl AdviceMessages {
    fn new(calm: &str, stressed: &str) -> Self {
        Self {
            calm: calm.to_string(),
            stressed: stressed.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceTable {
    pub entries: BTreeMap<EmotionLabel, AdviceMessages>,
    /// Required; used for any emotion without an entry.
    pub fallback: AdviceMessages,
    /// Stress index above which the `stressed` message is chosen.
    pub stress_split: f64,
}

impl Default for AdviceTable {
    fn default() -> Self {
        let entries = [
            (
                EmotionLabel::Happy,
                AdviceMessages::new(
                    "Great work, keep going at this pace.",
                    "You seem happy but under pressure. Take a short break.",
                ),
            ),
            (
                EmotionLabel::Sad,
                AdviceMessages::new(
                    "Try an easier exercise to rebuild momentum.",
                    "You seem discouraged. Rest a little and come back later.",
                ),
            ),
            (
                EmotionLabel::Angry,
                AdviceMessages::new(
                    "Stay calm and take a few deep breaths.",
                    "Stress is too high. A break is strongly recommended.",
                ),
            ),
            (
                EmotionLabel::Tired,
                AdviceMessages::new(
                    "A little tired. Continue with a light exercise.",
                    "Very tired. Pause now and come back later.",
                ),
            ),
            (
                EmotionLabel::Focused,
                AdviceMessages::new(
                    "Good focus. Carry on with your session.",
                    "Highly focused but tense. Slow down a little.",
                ),
            ),
            (
                EmotionLabel::Confused,
                AdviceMessages::new(
                    "Re-read the theory before the next exercise.",
                    "Too much confusion. Switch topic or take a break.",
                ),
            ),
        ]
        .into_iter()
        .collect();

        Self {
            entries,
            fallback: AdviceMessages::new("Continue at your own pace.", "Take a short break."),
            stress_split: 0.6,
        }
    }
}

impl AdviceTable {
    pub fn message_for(&self, emotion: EmotionLabel, stress_index: f64) -> &str {
        let messages = self.entries.get(&emotion).unwrap_or(&self.fallback);
        if stress_index > self.stress_split {
            &messages.stressed
        } else {
            &messages.calm
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub window: WindowConfig,
    pub emotion_weights: EmotionWeightTable,
    pub trend: TrendThresholds,
    pub factors: FactorWeights,
    pub emotional_fit: EmotionalFitParams,
    pub recommendation: RecommendationParams,
    pub adaptation: AdaptationThresholds,
    pub advice: AdviceTable,
    pub limits: LearnerLimits,
}

impl AdaptiveConfig {
    /// File (when `ADAPTIVE_CONFIG_PATH` is set) or defaults, then env overrides, then validation.
    pub fn load() -> AdaptiveResult<Self> {
        let mut config = match std::env::var("ADAPTIVE_CONFIG_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> AdaptiveResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AdaptiveError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> AdaptiveResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| AdaptiveError::config(format!("invalid engine config: {err}")))
    }

    pub fn apply_env(&mut self) -> AdaptiveResult<()> {
        if let Some(val) = env_parse::<usize>("ADAPTIVE_WINDOW_SIZE")? {
            self.window.max_events = val;
        }
        if let Some(val) = env_parse::<i64>("ADAPTIVE_WINDOW_MAX_AGE_MS")? {
            self.window.max_age_ms = (val > 0).then_some(val);
        }
        if let Some(val) = env_parse::<f64>("ADAPTIVE_TREND_THRESHOLD")? {
            self.trend.threshold = val;
        }
        if let Some(val) = env_parse::<f64>("ADAPTIVE_MIN_CONFIDENCE")? {
            self.recommendation.min_confidence_floor = val;
        }
        if let Some(val) = env_parse::<usize>("ADAPTIVE_MAX_RESULTS")? {
            self.recommendation.max_results = val;
        }
        if let Some(val) = env_parse::<f64>("ADAPTIVE_STRESS_HIGH")? {
            self.adaptation.stress_high = val;
        }
        if let Some(val) = env_parse::<f64>("ADAPTIVE_FATIGUE_HIGH")? {
            self.adaptation.fatigue_high = val;
        }
        if let Some(val) = env_parse::<usize>("ADAPTIVE_MAX_LEARNERS")? {
            self.limits.max_learners = val;
        }
        Ok(())
    }

    pub fn validate(&self) -> AdaptiveResult<()> {
        if self.window.max_events == 0 {
            return Err(AdaptiveError::config("window.max_events must be at least 1"));
        }
        if matches!(self.window.max_age_ms, Some(age) if age <= 0) {
            return Err(AdaptiveError::config("window.max_age_ms must be positive"));
        }

        let table = &self.emotion_weights;
        for label in EmotionLabel::ALL {
            let Some(weights) = table.weights.get(&label) else {
                return Err(AdaptiveError::config(format!(
                    "emotion_weights has no entry for '{}'",
                    label.as_str()
                )));
            };
            let prefix = format!("emotion_weights.{}", label.as_str());
            unit_interval(&format!("{prefix}.stress"), weights.stress)?;
            unit_interval(&format!("{prefix}.engagement"), weights.engagement)?;
            unit_interval(&format!("{prefix}.fatigue"), weights.fatigue)?;
        }

        unit_interval("trend.threshold", self.trend.threshold)?;

        let mut total = 0.0;
        for (name, weight) in self.factors.as_pairs() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AdaptiveError::config(format!(
                    "factors.{name} must be a non-negative number"
                )));
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(AdaptiveError::config("factor weights must not all be zero"));
        }

        let fit = &self.emotional_fit;
        unit_interval("emotional_fit.stress_threshold", fit.stress_threshold)?;
        unit_interval("emotional_fit.stress_penalty", fit.stress_penalty)?;
        unit_interval("emotional_fit.fatigue_threshold", fit.fatigue_threshold)?;
        unit_interval("emotional_fit.fatigue_bonus", fit.fatigue_bonus)?;
        unit_interval("emotional_fit.light_load_cutoff", fit.light_load_cutoff)?;
        unit_interval(
            "emotional_fit.low_engagement_threshold",
            fit.low_engagement_threshold,
        )?;
        unit_interval("emotional_fit.interactive_bonus", fit.interactive_bonus)?;

        let rec = &self.recommendation;
        unit_interval(
            "recommendation.min_confidence_floor",
            rec.min_confidence_floor,
        )?;
        unit_interval("recommendation.weak_success_rate", rec.weak_success_rate)?;
        if rec.max_results == 0 {
            return Err(AdaptiveError::config(
                "recommendation.max_results must be at least 1",
            ));
        }
        if !rec.recency_horizon_hours.is_finite() || rec.recency_horizon_hours <= 0.0 {
            return Err(AdaptiveError::config(
                "recommendation.recency_horizon_hours must be positive",
            ));
        }

        let adapt = &self.adaptation;
        unit_interval("adaptation.stress_high", adapt.stress_high)?;
        unit_interval("adaptation.fatigue_high", adapt.fatigue_high)?;
        unit_interval("adaptation.engagement_low", adapt.engagement_low)?;
        unit_interval("adaptation.stress_low", adapt.stress_low)?;
        unit_interval("adaptation.engagement_high", adapt.engagement_high)?;
        unit_interval("adaptation.mastery_score", adapt.mastery_score)?;
        unit_interval("adaptation.struggling_score", adapt.struggling_score)?;
        unit_interval("adaptation.difficulty_stress", adapt.difficulty_stress)?;
        if adapt.struggling_score > adapt.mastery_score {
            return Err(AdaptiveError::config(
                "adaptation.struggling_score must not exceed adaptation.mastery_score",
            ));
        }

        if self.limits.max_learners == 0 || self.limits.max_issued_per_learner == 0 {
            return Err(AdaptiveError::config(
                "limits.max_learners and limits.max_issued_per_learner must be at least 1",
            ));
        }

        let advice = &self.advice;
        unit_interval("advice.stress_split", advice.stress_split)?;
        if advice.fallback.calm.trim().is_empty() || advice.fallback.stressed.trim().is_empty() {
            return Err(AdaptiveError::config(
                "advice.fallback requires both calm and stressed messages",
            ));
        }

        Ok(())
    }
}

fn unit_interval(name: &str, value: f64) -> AdaptiveResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AdaptiveError::config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn env_parse<T: FromStr>(key: &str) -> AdaptiveResult<Option<T>> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| AdaptiveError::config(format!("{key} has an invalid value: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AdaptiveConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_emotion_row_is_rejected() {
        let mut config = AdaptiveConfig::default();
        config.emotion_weights.weights.remove(&EmotionLabel::Tired);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AdaptiveError::Configuration(ref msg) if msg.contains("tired")));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = AdaptiveConfig::default();
        config.adaptation.stress_high = 1.5;
        assert!(config.validate().is_err());

        let mut config = AdaptiveConfig::default();
        config.emotional_fit.stress_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_factor_weights_are_rejected() {
        let mut config = AdaptiveConfig::default();
        config.factors = FactorWeights {
            topic_affinity: 0.0,
            difficulty_fit: 0.0,
            emotional_fit: 0.0,
            recency: 0.0,
            performance: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_difficulty_scores_are_rejected() {
        let mut config = AdaptiveConfig::default();
        config.adaptation.struggling_score = 0.9;
        config.adaptation.mastery_score = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_learner_cap_is_rejected() {
        let mut config = AdaptiveConfig::default();
        config.limits.max_learners = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_advice_fallback_is_rejected() {
        let mut config = AdaptiveConfig::default();
        config.advice.fallback.stressed = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AdaptiveConfig::from_json(r#"{"window": {"max_events": 3}}"#).unwrap();
        assert_eq!(config.window.max_events, 3);
        assert_eq!(config.recommendation.max_results, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn advice_falls_back_for_unmapped_emotion() {
        let table = AdviceTable::default();
        assert_eq!(
            table.message_for(EmotionLabel::Disgusted, 0.1),
            "Continue at your own pace."
        );
        assert_eq!(table.message_for(EmotionLabel::Disgusted, 0.9), "Take a short break.");
    }
}
