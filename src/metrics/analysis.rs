//! Self-analysis: improvement suggestions and per-user recommendations

use std::collections::BTreeMap;
use tracing::debug;

use super::aggregate::{mean, LearningMetrics};
use crate::config::LearningConfig;
use crate::learning::knowledge::KnowledgeBase;
use crate::types::{Interaction, Pattern, UserPreferences};

/// Suggestions for the operators of the assistant.
///
/// Three checks, in this order: low-confidence patterns grouped by category,
/// categories with low mean satisfaction, slow average response time. An
/// empty result means nothing needs attention.
pub fn improvement_suggestions(
    interactions: &[Interaction],
    patterns: &[Pattern],
    config: &LearningConfig,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    // Low confidence patterns, grouped by category
    let mut weak: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for pattern in patterns.iter().filter(|p| p.confidence < config.low_confidence_threshold) {
        weak.entry(pattern.category.as_str()).or_default().push(pattern.pattern.as_str());
    }
    for (category, weak_patterns) in &weak {
        suggestions.push(format!(
            "Migliorare le risposte per la categoria '{}': {} pattern con confidenza bassa ({})",
            category,
            weak_patterns.len(),
            weak_patterns.join(", ")
        ));
    }

    // Unsatisfied categories
    let metrics = LearningMetrics::from_interactions(interactions);
    for stats in &metrics.problem_categories {
        if stats.average_satisfaction < config.low_satisfaction_threshold {
            suggestions.push(format!(
                "Soddisfazione bassa nella categoria '{}' ({:.1}/5 su {} interazioni): rivedere le risposte",
                stats.category, stats.average_satisfaction, stats.count
            ));
        }
    }

    // Response time
    let avg_response = mean(interactions.iter().map(|i| i.response_time as f64));
    if avg_response > config.slow_response_ms {
        suggestions.push(format!(
            "Tempo di risposta medio elevato ({:.0}ms): ottimizzare la generazione delle risposte",
            avg_response
        ));
    }

    debug!("Generated {} improvement suggestions", suggestions.len());
    suggestions
}

/// Recommendations for one user, driven by their stored preferences
pub fn personalized_recommendations(
    preferences: Option<&UserPreferences>,
    knowledge_base: &KnowledgeBase,
) -> Vec<String> {
    let Some(prefs) = preferences else {
        return Vec::new();
    };
    let mut recommendations = Vec::new();

    if let Some(category) = prefs.preferred_category.as_deref() {
        recommendations.push(format!(
            "Consulta le guide dedicate alla categoria {} per risposte più rapide",
            category
        ));
        if let Some((key, entry)) = knowledge_base.top_for_category(category, 1).first() {
            let topic = key.split_once(':').map(|(_, kws)| kws).unwrap_or_default();
            if !topic.is_empty() {
                recommendations.push(format!(
                    "Argomento più richiesto in {}: {} ({} richieste)",
                    category,
                    topic.replace(',', ", "),
                    entry.count
                ));
            }
        }
    }

    if let Some(issues) = prefs.common_issues.as_ref().filter(|issues| !issues.is_empty()) {
        recommendations.push(format!(
            "Abbiamo preparato soluzioni rapide per: {}",
            issues.join(", ")
        ));
    }

    match prefs.experience_level.as_deref() {
        Some("beginner") | Some("principiante") => {
            recommendations.push("Inizia dal tour guidato della dashboard per conoscere conti e transazioni".to_string());
        }
        Some("intermediate") | Some("intermedio") => {
            recommendations.push("Scopri le funzioni di analisi di fondi, azioni e obbligazioni".to_string());
        }
        Some("expert") | Some("advanced") | Some("esperto") => {
            recommendations.push("Prova i report personalizzati e l'esportazione avanzata dei dati".to_string());
        }
        _ => {}
    }

    recommendations
}
