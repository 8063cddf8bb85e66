use std::collections::{BTreeMap, VecDeque};

use crate::adaptive::config::{AdaptiveConfig, EmotionWeightTable, TrendThresholds, WindowConfig};
use crate::adaptive::error::{AdaptiveError, AdaptiveResult};
use crate::adaptive::types::{
    EmotionEvent, EmotionIndices, EmotionLabel, EmotionalStateSummary, RawEmotionEvent, Trend,
};

/// Sliding window of one learner's recent emotion events.
#[derive(Debug, Clone, Default)]
pub struct LearnerWindow {
    events: VecDeque<EmotionEvent>,
    newest_ts: Option<i64>,
    last_summary: Option<EmotionalStateSummary>,
}

impl LearnerWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn summary(&self) -> Option<&EmotionalStateSummary> {
        self.last_summary.as_ref()
    }
}

pub struct EmotionAggregator {
    window: WindowConfig,
    weights: EmotionWeightTable,
    trend: TrendThresholds,
}

impl EmotionAggregator {
    pub fn new(window: WindowConfig, weights: EmotionWeightTable, trend: TrendThresholds) -> Self {
        Self {
            window,
            weights,
            trend,
        }
    }

    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self::new(
            config.window.clone(),
            config.emotion_weights.clone(),
            config.trend.clone(),
        )
    }

    /// Validates the classifier output, mapping unknown labels to the fallback
    /// unless strict labels are configured.
    pub fn validate(&self, raw: &RawEmotionEvent) -> AdaptiveResult<EmotionEvent> {
        if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
            return Err(AdaptiveError::invalid_event(format!(
                "confidence {} outside [0, 1]",
                raw.confidence
            )));
        }
        if raw.timestamp < 0 {
            return Err(AdaptiveError::invalid_event(format!(
                "negative timestamp {}",
                raw.timestamp
            )));
        }

        let label = match EmotionLabel::parse(&raw.label) {
            Some(label) => label,
            None if self.weights.strict_labels => {
                return Err(AdaptiveError::invalid_event(format!(
                    "unrecognized emotion label '{}'",
                    raw.label
                )));
            }
            None => {
                tracing::warn!(
                    label = %raw.label,
                    fallback = self.weights.fallback_label.as_str(),
                    "unrecognized emotion label mapped to fallback"
                );
                self.weights.fallback_label
            }
        };

        Ok(EmotionEvent {
            label,
            confidence: raw.confidence,
            timestamp: raw.timestamp,
        })
    }

    pub fn ingest(
        &self,
        window: &mut LearnerWindow,
        raw: &RawEmotionEvent,
    ) -> AdaptiveResult<EmotionalStateSummary> {
        let event = self.validate(raw)?;
        Ok(self.ingest_event(window, event))
    }

    pub fn ingest_event(
        &self,
        window: &mut LearnerWindow,
        event: EmotionEvent,
    ) -> EmotionalStateSummary {
        window.events.push_back(event);
        let newest = window
            .newest_ts
            .map_or(event.timestamp, |ts| ts.max(event.timestamp));
        window.newest_ts = Some(newest);
        self.evict(window, newest);

        let summary = self.summarize(window, newest);
        window.last_summary = Some(summary.clone());
        summary
    }

    fn evict(&self, window: &mut LearnerWindow, newest: i64) {
        if let Some(max_age) = self.window.max_age_ms {
            let cutoff = newest.saturating_sub(max_age);
            window.events.retain(|e| e.timestamp >= cutoff);
        }
        while window.events.len() > self.window.max_events {
            window.events.pop_front();
        }
    }

    fn summarize(&self, window: &LearnerWindow, newest: i64) -> EmotionalStateSummary {
        // label -> (count, index of latest occurrence)
        let mut counts: BTreeMap<EmotionLabel, (usize, usize)> = BTreeMap::new();
        for (idx, event) in window.events.iter().enumerate() {
            let entry = counts.entry(event.label).or_insert((0, idx));
            entry.0 += 1;
            entry.1 = idx;
        }

        let total = window.events.len().max(1) as f64;
        let emotion_distribution: BTreeMap<EmotionLabel, f64> = counts
            .iter()
            .map(|(label, (count, _))| (*label, *count as f64 / total))
            .collect();

        let dominant_emotion = counts
            .iter()
            .max_by(|a, b| (a.1 .0, a.1 .1).cmp(&(b.1 .0, b.1 .1)))
            .map(|(label, _)| *label)
            .unwrap_or(self.weights.fallback_label);

        let indices = self.indices(&emotion_distribution);
        let trend = match window.last_summary.as_ref() {
            Some(previous) => self.classify_trend(&previous.indices(), &indices),
            None => Trend::Stable,
        };

        EmotionalStateSummary {
            dominant_emotion,
            emotion_distribution,
            stress_index: indices.stress,
            engagement_index: indices.engagement,
            fatigue_index: indices.fatigue,
            trend,
            sample_count: window.events.len(),
            updated_at: newest,
        }
    }

    fn indices(&self, distribution: &BTreeMap<EmotionLabel, f64>) -> EmotionIndices {
        let mut indices = EmotionIndices::default();
        for (label, fraction) in distribution {
            let w = self.weights.get(*label);
            indices.stress += fraction * w.stress;
            indices.engagement += fraction * w.engagement;
            indices.fatigue += fraction * w.fatigue;
        }
        EmotionIndices {
            stress: indices.stress.clamp(0.0, 1.0),
            engagement: indices.engagement.clamp(0.0, 1.0),
            fatigue: indices.fatigue.clamp(0.0, 1.0),
        }
    }

    /// Improving when no index worsens beyond the threshold and at least one
    /// improves beyond it: stress or fatigue falling, engagement rising.
    /// Declining is the mirror image. Mixed movements are stable.
    fn classify_trend(&self, previous: &EmotionIndices, current: &EmotionIndices) -> Trend {
        let thr = self.trend.threshold;
        // positive means better for the learner
        let moves = [
            previous.stress - current.stress,
            previous.fatigue - current.fatigue,
            current.engagement - previous.engagement,
        ];

        let improved = moves.iter().any(|d| *d > thr);
        let worsened = moves.iter().any(|d| *d < -thr);
        match (improved, worsened) {
            (true, false) => Trend::Improving,
            (false, true) => Trend::Declining,
            _ => Trend::Stable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, confidence: f64, timestamp: i64) -> RawEmotionEvent {
        RawEmotionEvent {
            label: label.to_string(),
            confidence,
            timestamp,
        }
    }

    fn aggregator(max_events: usize) -> EmotionAggregator {
        EmotionAggregator::new(
            WindowConfig {
                max_events,
                max_age_ms: None,
            },
            EmotionWeightTable::default(),
            TrendThresholds::default(),
        )
    }

    #[test]
    fn dominant_emotion_is_most_frequent() {
        let agg = aggregator(3);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("happy", 0.9, 1)).unwrap();
        agg.ingest(&mut window, &raw("happy", 0.8, 2)).unwrap();
        let summary = agg.ingest(&mut window, &raw("sad", 0.6, 3)).unwrap();

        assert_eq!(summary.dominant_emotion, EmotionLabel::Happy);
        let happy = summary.emotion_distribution[&EmotionLabel::Happy];
        let sad = summary.emotion_distribution[&EmotionLabel::Sad];
        assert!((happy - 2.0 / 3.0).abs() < 1e-9);
        assert!((sad - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn tie_goes_to_most_recent_label() {
        let agg = aggregator(4);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("sad", 0.5, 1)).unwrap();
        agg.ingest(&mut window, &raw("happy", 0.5, 2)).unwrap();
        agg.ingest(&mut window, &raw("happy", 0.5, 3)).unwrap();
        let summary = agg.ingest(&mut window, &raw("sad", 0.5, 4)).unwrap();
        assert_eq!(summary.dominant_emotion, EmotionLabel::Sad);
    }

    #[test]
    fn window_evicts_oldest_by_count() {
        let agg = aggregator(2);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("angry", 0.9, 1)).unwrap();
        agg.ingest(&mut window, &raw("happy", 0.9, 2)).unwrap();
        let summary = agg.ingest(&mut window, &raw("happy", 0.9, 3)).unwrap();
        assert_eq!(window.len(), 2);
        assert!(!summary.emotion_distribution.contains_key(&EmotionLabel::Angry));
        assert_eq!(summary.stress_index, 0.0);
    }

    #[test]
    fn window_evicts_by_age() {
        let agg = EmotionAggregator::new(
            WindowConfig {
                max_events: 10,
                max_age_ms: Some(1_000),
            },
            EmotionWeightTable::default(),
            TrendThresholds::default(),
        );
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("angry", 0.9, 0)).unwrap();
        agg.ingest(&mut window, &raw("focused", 0.9, 500)).unwrap();
        let summary = agg.ingest(&mut window, &raw("focused", 0.9, 1_400)).unwrap();
        assert_eq!(summary.sample_count, 2);
        assert_eq!(summary.dominant_emotion, EmotionLabel::Focused);
    }

    #[test]
    fn invalid_confidence_is_rejected_without_touching_window() {
        let agg = aggregator(3);
        let mut window = LearnerWindow::new();
        let err = agg.ingest(&mut window, &raw("happy", 1.2, 1)).unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidEvent(_)));
        assert!(window.is_empty());

        let err = agg.ingest(&mut window, &raw("happy", f64::NAN, 1)).unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidEvent(_)));
    }

    #[test]
    fn unknown_label_maps_to_fallback() {
        let agg = aggregator(3);
        let mut window = LearnerWindow::new();
        let summary = agg.ingest(&mut window, &raw("bored", 0.7, 1)).unwrap();
        assert_eq!(summary.dominant_emotion, EmotionLabel::Neutral);
    }

    #[test]
    fn unknown_label_rejected_when_strict() {
        let mut weights = EmotionWeightTable::default();
        weights.strict_labels = true;
        let agg = EmotionAggregator::new(WindowConfig::default(), weights, TrendThresholds::default());
        let mut window = LearnerWindow::new();
        let err = agg.ingest(&mut window, &raw("bored", 0.7, 1)).unwrap_err();
        assert!(matches!(err, AdaptiveError::InvalidEvent(_)));
    }

    #[test]
    fn indices_follow_weight_table() {
        let agg = aggregator(2);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("angry", 0.9, 1)).unwrap();
        let summary = agg.ingest(&mut window, &raw("tired", 0.9, 2)).unwrap();
        assert!((summary.stress_index - 0.4).abs() < 1e-9);
        assert!((summary.fatigue_index - 0.4).abs() < 1e-9);
        assert!((summary.engagement_index - 0.3).abs() < 1e-9);
    }

    #[test]
    fn trend_tracks_consecutive_windows() {
        let agg = aggregator(2);
        let mut window = LearnerWindow::new();
        let first = agg.ingest(&mut window, &raw("angry", 0.9, 1)).unwrap();
        assert_eq!(first.trend, Trend::Stable);

        // stress 0.8 -> 0.4, engagement 0.3 -> 0.6
        let improving = agg.ingest(&mut window, &raw("focused", 0.9, 2)).unwrap();
        assert_eq!(improving.trend, Trend::Improving);

        let steady = agg.ingest(&mut window, &raw("focused", 0.9, 3)).unwrap();
        assert_eq!(steady.trend, Trend::Improving);

        // engagement 0.9 -> 0.6, fatigue 0 -> 0.4
        let declining = agg.ingest(&mut window, &raw("tired", 0.9, 4)).unwrap();
        assert_eq!(declining.trend, Trend::Declining);

        let repeat = agg.ingest(&mut window, &raw("tired", 0.9, 5)).unwrap();
        assert_eq!(repeat.trend, Trend::Declining);
        let flat = agg.ingest(&mut window, &raw("tired", 0.9, 6)).unwrap();
        assert_eq!(flat.trend, Trend::Stable);
    }

    #[test]
    fn opposing_index_moves_are_stable() {
        let agg = aggregator(1);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("tired", 0.9, 1)).unwrap();

        // fatigue 0.8 -> 0, stress 0 -> 0.6, engagement flat
        let summary = agg.ingest(&mut window, &raw("confused", 0.9, 2)).unwrap();
        assert_eq!(summary.trend, Trend::Stable);

        // stress 0.6 -> 0, fatigue 0 -> 0.8
        let summary = agg.ingest(&mut window, &raw("tired", 0.9, 3)).unwrap();
        assert_eq!(summary.trend, Trend::Stable);
    }

    #[test]
    fn aligned_index_moves_set_the_trend() {
        let agg = aggregator(1);
        let mut window = LearnerWindow::new();
        agg.ingest(&mut window, &raw("angry", 0.9, 1)).unwrap();

        // stress 0.8 -> 0, engagement 0.3 -> 0.9
        let summary = agg.ingest(&mut window, &raw("focused", 0.9, 2)).unwrap();
        assert_eq!(summary.trend, Trend::Improving);

        // engagement 0.9 -> 0.3, fatigue 0 -> 0.8
        let summary = agg.ingest(&mut window, &raw("tired", 0.9, 3)).unwrap();
        assert_eq!(summary.trend, Trend::Declining);

        // fatigue 0.8 -> 0 on its own
        let summary = agg.ingest(&mut window, &raw("disgusted", 0.9, 4)).unwrap();
        assert_eq!(summary.trend, Trend::Improving);
    }

    #[test]
    fn replaying_sequence_is_deterministic() {
        let agg = aggregator(5);
        let events = [
            raw("happy", 0.9, 1),
            raw("confused", 0.4, 2),
            raw("tired", 0.7, 3),
            raw("happy", 0.6, 4),
        ];

        let run = || {
            let mut window = LearnerWindow::new();
            let mut last = None;
            for event in &events {
                last = Some(agg.ingest(&mut window, event).unwrap());
            }
            last.unwrap()
        };

        assert_eq!(run(), run());
    }
}
