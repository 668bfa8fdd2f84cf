//! Pattern store
//!
//! An ordered collection of keyword-OR patterns. Each pattern carries a
//! confidence and a success rate that are updated every time it matches a
//! new interaction.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::classifier;
use crate::types::{Interaction, Pattern};

/// Confidence assigned to a freshly created pattern
const NEW_PATTERN_CONFIDENCE: f64 = 0.5;

/// Maximum words taken from a question when creating a pattern
const NEW_PATTERN_WORDS: usize = 3;

/// Maximum entries in `related_patterns`
const MAX_RELATED: usize = 3;

const POSITIVE_FEEDBACK_MULTIPLIER: f64 = 1.1;
const OTHER_FEEDBACK_MULTIPLIER: f64 = 0.9;
const MAX_USAGE_MULTIPLIER: f64 = 1.2;

/// Built-in patterns: (pattern, category)
const SEED_PATTERNS: &[(&str, &str)] = &[
    ("login|accesso|accedere|entrare|password", "Accesso"),
    ("transazione|pagamento|bonifico", "Transazioni"),
    ("errore|problema|non funziona", "Errori"),
];
const SEED_CONFIDENCE: f64 = 0.8;
const SEED_SUCCESS_RATE: f64 = 0.7;

/// Ordered, mutable pattern collection
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    patterns: Vec<Pattern>,
}

impl PatternStore {
    /// A store holding only the built-in patterns
    pub fn seeded() -> Self {
        Self { patterns: seed_patterns(Utc::now()) }
    }

    /// Wrap loaded patterns, re-clamping any out-of-range scores
    pub fn from_patterns(patterns: Vec<Pattern>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|mut p| {
                p.confidence = clamp01(p.confidence);
                p.success_rate = clamp01(p.success_rate);
                p
            })
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Drop everything and restore the built-in patterns
    pub fn reseed(&mut self) {
        self.patterns = seed_patterns(Utc::now());
    }

    /// Index of the first pattern (insertion order) matching `question`
    pub fn find_match(&self, question: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(question))
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// Update the pattern at `index` with the outcome of `interaction`
    pub fn record_usage(&mut self, index: usize, interaction: &Interaction) {
        if let Some(pattern) = self.patterns.get_mut(index) {
            apply_usage(pattern, interaction.resolution_success, interaction.feedback.is_positive(), interaction.timestamp);
            debug!(
                "Pattern '{}' used {} times (confidence {:.3}, success {:.3})",
                pattern.pattern, pattern.usage_count, pattern.confidence, pattern.success_rate
            );
        }
    }

    /// Build and append a pattern from the first long words of the question.
    ///
    /// Returns `None` when the question has no word longer than three
    /// characters; an empty pattern would match every question.
    pub fn create_from_question(&mut self, interaction: &Interaction) -> Option<&Pattern> {
        let words: Vec<&str> = interaction
            .question
            .split_whitespace()
            .filter(|w| w.chars().count() > 3)
            .take(NEW_PATTERN_WORDS)
            .collect();
        if words.is_empty() {
            debug!("No pattern words in question '{}'", interaction.question);
            return None;
        }

        let pattern = Pattern {
            pattern: words.join("|"),
            confidence: NEW_PATTERN_CONFIDENCE,
            success_rate: if interaction.resolution_success { 1.0 } else { 0.0 },
            usage_count: 1,
            last_used: interaction.timestamp,
            related_patterns: self.find_related(&interaction.question),
            category: interaction.category.clone(),
            keywords: interaction.keywords.clone(),
        };
        self.patterns.push(pattern);
        self.patterns.last()
    }

    /// Up to three pattern strings sharing a keyword or the category with `question`
    pub fn find_related(&self, question: &str) -> Vec<String> {
        let lower = question.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        let category = classifier::categorize(&lower);

        self.patterns
            .iter()
            .filter(|p| {
                p.category == category || p.keywords.iter().any(|kw| tokens.contains(&kw.as_str()))
            })
            .take(MAX_RELATED)
            .map(|p| p.pattern.clone())
            .collect()
    }
}

/// The success-rate and confidence recurrence. Order matters: the usage count
/// is incremented first, then the success rate is averaged over the new count,
/// then the confidence is scaled using the new count.
fn apply_usage(pattern: &mut Pattern, success: bool, positive: bool, at: DateTime<Utc>) {
    pattern.usage_count = pattern.usage_count.saturating_add(1);
    pattern.last_used = at;

    let usage = pattern.usage_count.max(1) as f64;
    let outcome = if success { 1.0 } else { 0.0 };
    pattern.success_rate = clamp01((pattern.success_rate * (usage - 1.0) + outcome) / usage);

    let feedback_multiplier = if positive {
        POSITIVE_FEEDBACK_MULTIPLIER
    } else {
        OTHER_FEEDBACK_MULTIPLIER
    };
    let usage_multiplier = (1.0 + usage * 0.01).min(MAX_USAGE_MULTIPLIER);
    pattern.confidence = clamp01(pattern.confidence * feedback_multiplier * usage_multiplier);
}

fn seed_patterns(now: DateTime<Utc>) -> Vec<Pattern> {
    SEED_PATTERNS
        .iter()
        .map(|(pattern, category)| Pattern {
            pattern: pattern.to_string(),
            confidence: SEED_CONFIDENCE,
            success_rate: SEED_SUCCESS_RATE,
            usage_count: 0,
            last_used: now,
            related_patterns: vec![],
            category: category.to_string(),
            keywords: pattern.split('|').map(str::to_string).collect(),
        })
        .collect()
}

/// Clamp to [0, 1]; NaN becomes 0
pub(crate) fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Seed pattern strings, in insertion order
pub fn seed_pattern_strings() -> Vec<&'static str> {
    SEED_PATTERNS.iter().map(|(p, _)| *p).collect()
}
