//! Shared types used across modules
//!
//! The learning records live here so that the classifier, the pattern store,
//! the metrics aggregator and the storage layer can all use them without
//! depending on the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User feedback on a single exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
    Neutral,
}

impl Feedback {
    /// Satisfaction score on the 1-5 scale
    pub fn satisfaction(&self) -> u8 {
        match self {
            Feedback::Positive => 5,
            Feedback::Neutral => 3,
            Feedback::Negative => 1,
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Feedback::Positive)
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Positive => write!(f, "positive"),
            Feedback::Negative => write!(f, "negative"),
            Feedback::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Feedback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "+" => Ok(Feedback::Positive),
            "negative" | "neg" | "-" => Ok(Feedback::Negative),
            "neutral" | "0" => Ok(Feedback::Neutral),
            other => anyhow::bail!("Unknown feedback '{}': expected positive, negative or neutral", other),
        }
    }
}

/// One recorded question/response/feedback exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default)]
    pub id: String,
    /// Lower-cased question text
    pub question: String,
    pub feedback: Feedback,
    /// Derived quality score (1-10)
    pub response_quality: u8,
    /// Derived satisfaction score (1-5)
    pub user_satisfaction: u8,
    pub timestamp: DateTime<Utc>,
    pub context: String,
    /// At most five extracted keywords
    pub keywords: Vec<String>,
    pub category: String,
    /// Response latency in milliseconds
    pub response_time: u64,
    pub follow_up_questions: Vec<String>,
    /// True iff the feedback was positive
    pub resolution_success: bool,
}

/// A keyword-OR rule with adaptive scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    /// Alternatives separated by `|`, e.g. `login|accesso|entrare`
    pub pattern: String,
    pub confidence: f64,
    pub success_rate: f64,
    pub usage_count: u64,
    pub last_used: DateTime<Utc>,
    pub related_patterns: Vec<String>,
    pub category: String,
    pub keywords: Vec<String>,
}

impl Pattern {
    /// Non-empty alternatives of the pattern string
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.pattern.split('|').map(str::trim).filter(|alt| !alt.is_empty())
    }

    /// Whether `text` contains any of the alternatives
    pub fn matches(&self, text: &str) -> bool {
        self.alternatives().any(|alt| text.contains(alt))
    }
}

/// Aggregated statistics for a category + keyword combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub count: u64,
    pub average_satisfaction: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Per-user preference record; unknown fields are kept as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_issues: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPreferences {
    /// Shallow merge: every field present in `partial` replaces the stored one
    pub fn merge(&mut self, partial: UserPreferences) {
        if partial.preferred_category.is_some() {
            self.preferred_category = partial.preferred_category;
        }
        if partial.common_issues.is_some() {
            self.common_issues = partial.common_issues;
        }
        if partial.experience_level.is_some() {
            self.experience_level = partial.experience_level;
        }
        self.extra.extend(partial.extra);
    }
}
