//! Learning engine
//!
//! Owns the interaction log, the pattern store, the knowledge base and the
//! user preference map. Every state change is written through to storage;
//! storage failures are logged and never surface to the caller.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::classifier;
use super::knowledge::KnowledgeBase;
use super::patterns::PatternStore;
use crate::config::LearningConfig;
use crate::metrics::{self, LearningMetrics};
use crate::storage::persistence::{
    INTERACTIONS_KEY, KNOWLEDGE_BASE_KEY, PATTERNS_KEY, USER_PREFERENCES_KEY,
};
use crate::storage::{KeyValueStore, MemoryStore, Persistence};
use crate::types::{Feedback, Interaction, KnowledgeEntry, Pattern, UserPreferences};

const BASE_QUALITY: i32 = 5;
const FEEDBACK_QUALITY_DELTA: i32 = 3;
const LONG_RESPONSE_CHARS: usize = 100;
const STEP_MARKERS: &[&str] = &["passo", "1."];
const TIP_MARKERS: &[&str] = &["suggerimento", "consiglio"];

/// Complete, re-importable image of the engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningSnapshot {
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub knowledge_base: Vec<(String, KnowledgeEntry)>,
    #[serde(default)]
    pub user_preferences: Vec<(String, UserPreferences)>,
    /// Informational; ignored on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LearningMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// The learning/feedback engine
pub struct LearningEngine {
    interactions: Vec<Interaction>,
    patterns: PatternStore,
    knowledge_base: KnowledgeBase,
    user_preferences: BTreeMap<String, UserPreferences>,
    persistence: Persistence,
    config: LearningConfig,
}

impl LearningEngine {
    /// Load state from `store`, using default thresholds
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_config(store, LearningConfig::default())
    }

    /// Load state from `store`. Unreadable collections start empty; an empty
    /// pattern set is replaced by the built-in patterns.
    pub fn with_config(store: Box<dyn KeyValueStore>, config: LearningConfig) -> Self {
        let persistence = Persistence::new(store);
        let state = persistence.load_state();

        let patterns = if state.patterns.is_empty() {
            PatternStore::seeded()
        } else {
            PatternStore::from_patterns(state.patterns)
        };

        info!(
            "Learning engine loaded: {} interactions, {} patterns, {} knowledge entries, {} users",
            state.interactions.len(),
            patterns.len(),
            state.knowledge_base.len(),
            state.user_preferences.len()
        );

        Self {
            interactions: state.interactions,
            patterns,
            knowledge_base: KnowledgeBase::from_entries(state.knowledge_base),
            user_preferences: state.user_preferences.into_iter().collect(),
            persistence,
            config,
        }
    }

    /// Engine backed by a throwaway in-memory store
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Record one completed exchange
    pub fn record_interaction(
        &mut self,
        question: &str,
        response: &str,
        feedback: Feedback,
        context: &str,
        latency_ms: u64,
    ) {
        self.record_interaction_at(question, response, feedback, context, latency_ms, Utc::now());
    }

    /// Same as `record_interaction` with an explicit timestamp
    pub fn record_interaction_at(
        &mut self,
        question: &str,
        response: &str,
        feedback: Feedback,
        context: &str,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    ) {
        let question = question.to_lowercase();
        let classification = classifier::classify(&question);

        let interaction = Interaction {
            id: uuid::Uuid::new_v4().to_string(),
            follow_up_questions: classifier::generate_follow_ups(&question, response),
            question,
            feedback,
            response_quality: response_quality(response, feedback),
            user_satisfaction: feedback.satisfaction(),
            timestamp,
            context: context.to_string(),
            keywords: classification.keywords,
            category: classification.category,
            response_time: latency_ms,
            resolution_success: feedback.is_positive(),
        };

        match self.patterns.find_match(&interaction.question) {
            Some(index) => self.patterns.record_usage(index, &interaction),
            None => {
                if let Some(created) = self.patterns.create_from_question(&interaction) {
                    info!("Created pattern '{}' ({})", created.pattern, created.category);
                }
            }
        }

        self.knowledge_base.record(&interaction);

        debug!(
            "Recorded interaction {} [{}] feedback={} quality={}",
            interaction.id, interaction.category, interaction.feedback, interaction.response_quality
        );
        self.interactions.push(interaction);
        self.persist();
    }

    /// Dashboard metrics over the whole log
    pub fn learning_metrics(&self) -> LearningMetrics {
        LearningMetrics::from_interactions(&self.interactions)
    }

    /// Operator-facing suggestions; may be empty
    pub fn improvement_suggestions(&self) -> Vec<String> {
        metrics::improvement_suggestions(&self.interactions, self.patterns.patterns(), &self.config)
    }

    /// Recommendations for `user_id`; empty if the user has no preferences
    pub fn personalized_recommendations(&self, user_id: &str) -> Vec<String> {
        metrics::personalized_recommendations(self.user_preferences.get(user_id), &self.knowledge_base)
    }

    /// Shallow-merge `partial` into the user's preferences and persist
    pub fn update_user_preferences(&mut self, user_id: &str, partial: UserPreferences) {
        self.user_preferences
            .entry(user_id.to_string())
            .or_default()
            .merge(partial);
        debug!("Updated preferences for user {}", user_id);
        let preferences = self.user_preferences_pairs();
        save_logged(&mut self.persistence, USER_PREFERENCES_KEY, &preferences);
    }

    pub fn user_preferences(&self, user_id: &str) -> Option<&UserPreferences> {
        self.user_preferences.get(user_id)
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn patterns(&self) -> &[Pattern] {
        self.patterns.patterns()
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Current state plus metrics
    pub fn snapshot(&self) -> LearningSnapshot {
        LearningSnapshot {
            interactions: self.interactions.clone(),
            patterns: self.patterns.patterns().to_vec(),
            knowledge_base: self.knowledge_base.to_pairs(),
            user_preferences: self.user_preferences_pairs(),
            metrics: Some(self.learning_metrics()),
            exported_at: Some(Utc::now()),
        }
    }

    /// Serialized snapshot for backup or analysis
    pub fn export_learning_data(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .context("Failed to serialize learning data")
    }

    /// Replace all state with a previously exported document.
    ///
    /// A malformed document is rejected and the current state kept.
    pub fn import_learning_data(&mut self, json: &str) -> Result<()> {
        let snapshot: LearningSnapshot = serde_json::from_str(json)
            .context("Invalid learning data export")?;
        self.restore(snapshot);
        Ok(())
    }

    /// Replace all state with `snapshot` (its metrics are ignored)
    pub fn restore(&mut self, snapshot: LearningSnapshot) {
        self.interactions = snapshot.interactions;
        self.patterns = if snapshot.patterns.is_empty() {
            PatternStore::seeded()
        } else {
            PatternStore::from_patterns(snapshot.patterns)
        };
        self.knowledge_base = KnowledgeBase::from_entries(snapshot.knowledge_base);
        self.user_preferences = snapshot.user_preferences.into_iter().collect();

        info!(
            "Imported learning data: {} interactions, {} patterns",
            self.interactions.len(),
            self.patterns.len()
        );
        self.persist();
    }

    /// Clear everything and restore the built-in patterns
    pub fn reset_learning_data(&mut self) {
        self.interactions.clear();
        self.patterns.reseed();
        self.knowledge_base.clear();
        self.user_preferences.clear();
        info!("Learning data reset");
        self.persist();
    }

    fn user_preferences_pairs(&self) -> Vec<(String, UserPreferences)> {
        self.user_preferences
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write all four collections; failures leave in-memory state untouched
    fn persist(&mut self) {
        let preferences = self.user_preferences_pairs();
        let persistence = &mut self.persistence;
        save_logged(persistence, INTERACTIONS_KEY, &self.interactions);
        save_logged(persistence, PATTERNS_KEY, self.patterns.patterns());
        save_logged(persistence, KNOWLEDGE_BASE_KEY, &self.knowledge_base.to_pairs());
        save_logged(persistence, USER_PREFERENCES_KEY, &preferences);
    }
}

fn save_logged<T: Serialize + ?Sized>(persistence: &mut Persistence, key: &str, value: &T) {
    if let Err(e) = persistence.save(key, value) {
        warn!("Could not persist learning data: {}", e);
    }
}

/// Quality score in [1, 10] derived from feedback and response shape
pub fn response_quality(response: &str, feedback: Feedback) -> u8 {
    let mut quality = BASE_QUALITY;
    match feedback {
        Feedback::Positive => quality += FEEDBACK_QUALITY_DELTA,
        Feedback::Negative => quality -= FEEDBACK_QUALITY_DELTA,
        Feedback::Neutral => {}
    }

    let lower = response.to_lowercase();
    if response.chars().count() > LONG_RESPONSE_CHARS {
        quality += 1;
    }
    if STEP_MARKERS.iter().any(|m| lower.contains(m)) {
        quality += 1;
    }
    if TIP_MARKERS.iter().any(|m| lower.contains(m)) {
        quality += 1;
    }

    quality.clamp(1, 10) as u8
}
