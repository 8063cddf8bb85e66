use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Neutral,
    Surprised,
    Fearful,
    Disgusted,
    Tired,
    Focused,
    Confused,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 10] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Neutral,
        Self::Surprised,
        Self::Fearful,
        Self::Disgusted,
        Self::Tired,
        Self::Focused,
        Self::Confused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Neutral => "neutral",
            Self::Surprised => "surprised",
            Self::Fearful => "fearful",
            Self::Disgusted => "disgusted",
            Self::Tired => "tired",
            Self::Focused => "focused",
            Self::Confused => "confused",
        }
    }

    /// Strict parse; callers decide what an unknown label means.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Some(Self::Happy),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "neutral" => Some(Self::Neutral),
            "surprised" => Some(Self::Surprised),
            "fearful" => Some(Self::Fearful),
            "disgusted" => Some(Self::Disgusted),
            "tired" => Some(Self::Tired),
            "focused" => Some(Self::Focused),
            "confused" => Some(Self::Confused),
            _ => None,
        }
    }
}

/// Classifier output as it arrives on the wire, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmotionEvent {
    pub label: String,
    pub confidence: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionEvent {
    pub label: EmotionLabel,
    pub confidence: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    #[default]
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmotionIndices {
    pub stress: f64,
    pub engagement: f64,
    pub fatigue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalStateSummary {
    pub dominant_emotion: EmotionLabel,
    pub emotion_distribution: BTreeMap<EmotionLabel, f64>,
    pub stress_index: f64,
    pub engagement_index: f64,
    pub fatigue_index: f64,
    pub trend: Trend,
    pub sample_count: usize,
    pub updated_at: i64,
}

impl EmotionalStateSummary {
    pub fn indices(&self) -> EmotionIndices {
        EmotionIndices {
            stress: self.stress_index,
            engagement: self.engagement_index,
            fatigue: self.fatigue_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Content,
    Exercise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    #[default]
    Article,
    Interactive,
    Quiz,
    Exercise,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ProficiencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }

    pub fn rank(&self) -> i32 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: ContentKind,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub difficulty: ProficiencyLevel,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_cognitive_load")]
    pub cognitive_load: f64,
    #[serde(default)]
    pub is_review: bool,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

fn default_cognitive_load() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LearnerHistory {
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub proficiency: Option<ProficiencyLevel>,
    #[serde(default)]
    pub completed: HashSet<String>,
    /// content id -> last interaction, epoch millis
    #[serde(default)]
    pub last_seen: HashMap<String, i64>,
    /// topic -> success rate in [0,1]
    #[serde(default)]
    pub topic_success: HashMap<String, f64>,
}

impl LearnerHistory {
    pub fn is_eligible(&self, item: &CatalogItem) -> bool {
        !self.completed.contains(&item.id)
            && item
                .prerequisites
                .iter()
                .all(|prereq| self.completed.contains(prereq))
    }
}

pub struct RecommendationContext<'a> {
    pub emotional_state: &'a EmotionalStateSummary,
    pub learner_history: &'a LearnerHistory,
    pub catalog: &'a [CatalogItem],
    pub now_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Interests,
    Proficiency,
    EmotionalState,
    Recency,
    Performance,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interests => "interests",
            Self::Proficiency => "proficiency",
            Self::EmotionalState => "emotional_state",
            Self::Recency => "recency",
            Self::Performance => "performance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedFactor {
    pub name: String,
    pub weight: f64,
    pub value: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub content_id: String,
    pub kind: ContentKind,
    pub confidence_score: f64,
    pub reason_code: ReasonCode,
    pub factors: Vec<RankedFactor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub recommendation_id: String,
    pub helpful: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationAction {
    #[default]
    Continue,
    SuggestBreak,
    ReduceDifficulty,
    IncreaseDifficulty,
    SwitchTopic,
}

impl AdaptationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::SuggestBreak => "suggest_break",
            Self::ReduceDifficulty => "reduce_difficulty",
            Self::IncreaseDifficulty => "increase_difficulty",
            Self::SwitchTopic => "switch_topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptationAdvice {
    pub action: AdaptationAction,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_content_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub state: EmotionalStateSummary,
    pub recommendations: Vec<Recommendation>,
    pub advice: AdaptationAdvice,
    pub degraded: bool,
}
