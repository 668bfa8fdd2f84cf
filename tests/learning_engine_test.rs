//! Integration tests for the learning engine:
//! - Empty state and reset round-trip
//! - Feedback scoring and bounds
//! - The record/metrics scenario
//! - Persistence across engine instances (JSON files and SQLite)
//! - Export / import

use chrono::{TimeZone, Utc};
use fin_assistant::learning::classifier;
use fin_assistant::learning::patterns::seed_pattern_strings;
use fin_assistant::metrics::QuestionCount;
use fin_assistant::{Feedback, JsonFileStore, LearningEngine, LearningSnapshot, SqliteStore, UserPreferences};

fn assert_empty_metrics(engine: &LearningEngine) {
    let metrics = engine.learning_metrics();
    assert_eq!(metrics.total_interactions, 0);
    assert_eq!(metrics.positive_feedback, 0);
    assert_eq!(metrics.negative_feedback, 0);
    assert_eq!(metrics.average_satisfaction, 0.0);
    assert_eq!(metrics.response_accuracy, 0.0);
    assert!(metrics.popular_questions.is_empty());
    assert!(metrics.problem_categories.is_empty());
    assert!(metrics.common_keywords.is_empty());
    assert!(metrics.session_patterns.is_empty());
    assert_eq!(metrics.time_of_day.len(), 24);
    for (hour, entry) in metrics.time_of_day.iter().enumerate() {
        assert_eq!(entry.hour as usize, hour);
        assert_eq!(entry.activity, 0);
    }
}

fn pattern_strings(engine: &LearningEngine) -> Vec<String> {
    engine.patterns().iter().map(|p| p.pattern.clone()).collect()
}

#[test]
fn test_fresh_engine_is_empty() {
    let engine = LearningEngine::in_memory();
    assert_empty_metrics(&engine);
    assert_eq!(pattern_strings(&engine), seed_pattern_strings());
    assert!(engine.improvement_suggestions().is_empty());
}

#[test]
fn test_reset_round_trip() {
    let mut engine = LearningEngine::in_memory();
    engine.record_interaction("report mensile", "Ecco il report", Feedback::Neutral, "", 300);
    engine.record_interaction("login fallito", "Riprova", Feedback::Negative, "", 300);
    engine.update_user_preferences("u1", UserPreferences {
        preferred_category: Some("Report".to_string()),
        ..Default::default()
    });

    engine.reset_learning_data();

    assert_empty_metrics(&engine);
    assert_eq!(pattern_strings(&engine), seed_pattern_strings());
    assert!(engine.patterns().iter().all(|p| p.usage_count == 0));
    assert!(engine.knowledge_base().is_empty());
    assert!(engine.personalized_recommendations("u1").is_empty());

    let exported: LearningSnapshot = serde_json::from_str(&engine.export_learning_data().unwrap()).unwrap();
    assert_eq!(exported.patterns.len(), 3);
    assert!(exported.interactions.is_empty());
}

#[test]
fn test_satisfaction_follows_feedback() {
    let mut engine = LearningEngine::in_memory();
    for question in ["saldo", "Come pago la bolletta?", "", "errore 500 sul bonifico"] {
        engine.record_interaction(question, "risposta", Feedback::Positive, "", 10);
        engine.record_interaction(question, "risposta", Feedback::Neutral, "", 10);
        engine.record_interaction(question, "risposta", Feedback::Negative, "", 10);
    }

    for interaction in engine.interactions() {
        let expected = match interaction.feedback {
            Feedback::Positive => 5,
            Feedback::Neutral => 3,
            Feedback::Negative => 1,
        };
        assert_eq!(interaction.user_satisfaction, expected);
        assert_eq!(interaction.resolution_success, interaction.feedback == Feedback::Positive);
        assert!((1..=10).contains(&interaction.response_quality));
    }
}

#[test]
fn test_pattern_scores_stay_bounded() {
    let mut engine = LearningEngine::in_memory();
    for i in 0..150 {
        let feedback = if i % 4 == 0 { Feedback::Negative } else { Feedback::Positive };
        engine.record_interaction("problema con il login", "Passo 1. riprova", feedback, "", 50);
    }

    for pattern in engine.patterns() {
        assert!((0.0..=1.0).contains(&pattern.confidence), "{}", pattern.pattern);
        assert!((0.0..=1.0).contains(&pattern.success_rate), "{}", pattern.pattern);
    }
    assert_eq!(engine.patterns()[0].usage_count, 150);
}

#[test]
fn test_category_stability() {
    assert_eq!(classifier::categorize("Ho dimenticato la password per il login"), "Accesso");
}

#[test]
fn test_popular_questions_ordering() {
    let mut engine = LearningEngine::in_memory();
    for question in ["come pago?", "come pago?", "saldo conto"] {
        engine.record_interaction(question, "ok", Feedback::Positive, "", 10);
    }

    let popular = engine.learning_metrics().popular_questions;
    assert_eq!(
        popular,
        vec![
            QuestionCount { question: "come pago?".to_string(), count: 2 },
            QuestionCount { question: "saldo conto".to_string(), count: 1 },
        ]
    );
}

#[test]
fn test_three_interaction_scenario() {
    let mut engine = LearningEngine::in_memory();
    let access_index = engine
        .patterns()
        .iter()
        .position(|p| p.matches("non riesco ad accedere"))
        .expect("an access pattern is seeded");
    let seed_usage = engine.patterns()[access_index].usage_count;

    engine.record_interaction("non riesco ad accedere", "Controlla le credenziali", Feedback::Negative, "", 800);
    engine.record_interaction("non riesco ad accedere", "Reimposta la password", Feedback::Positive, "", 600);
    engine.record_interaction("report mensile", "Apri la sezione Report", Feedback::Neutral, "", 400);

    let metrics = engine.learning_metrics();
    assert_eq!(metrics.total_interactions, 3);
    assert_eq!(metrics.positive_feedback, 1);
    assert_eq!(metrics.negative_feedback, 1);

    let access = metrics
        .problem_categories
        .iter()
        .find(|c| c.category == "Accesso")
        .expect("Accesso category");
    assert_eq!(access.count, 2);
    assert!(metrics.problem_categories.iter().any(|c| c.category == "Report" && c.count == 1));

    assert_eq!(engine.patterns()[access_index].usage_count, seed_usage + 2);
    // "report mensile" matched no seed and created its own pattern
    assert!(engine.patterns().iter().any(|p| p.pattern == "report|mensile"));
}

#[test]
fn test_time_of_day_histogram() {
    let mut engine = LearningEngine::in_memory();
    let morning = Utc.with_ymd_and_hms(2026, 5, 4, 9, 15, 0).unwrap();
    let night = Utc.with_ymd_and_hms(2026, 5, 4, 22, 45, 0).unwrap();

    engine.record_interaction_at("saldo conto", "ok", Feedback::Positive, "", 10, morning);
    engine.record_interaction_at("saldo conto", "ok", Feedback::Positive, "", 10, morning);
    engine.record_interaction_at("fondi disponibili", "ok", Feedback::Neutral, "", 10, night);

    let hours = engine.learning_metrics().time_of_day;
    assert_eq!(hours.len(), 24);
    assert_eq!(hours[9].activity, 2);
    assert_eq!(hours[22].activity, 1);
    assert_eq!(hours.iter().filter(|h| h.activity == 0).count(), 22);
}

#[test]
fn test_suggestions_after_poor_feedback() {
    let mut engine = LearningEngine::in_memory();
    engine.record_interaction("estratto conto trimestrale", "...", Feedback::Negative, "", 9000);
    engine.record_interaction("estratto conto annuale", "...", Feedback::Negative, "", 8000);

    let suggestions = engine.improvement_suggestions();
    // New pattern starts at 0.5 confidence, the category is unhappy, responses are slow
    assert_eq!(suggestions.len(), 3);
    assert!(suggestions.iter().any(|s| s.contains("Conti")));
    assert!(suggestions.iter().any(|s| s.contains("8500ms")));
}

#[test]
fn test_preferences_merge_and_recommendations() {
    let mut engine = LearningEngine::in_memory();
    assert!(engine.personalized_recommendations("anna").is_empty());

    engine.update_user_preferences("anna", UserPreferences {
        preferred_category: Some("Investimenti".to_string()),
        ..Default::default()
    });
    engine.update_user_preferences("anna", UserPreferences {
        experience_level: Some("expert".to_string()),
        ..Default::default()
    });

    let prefs = engine.user_preferences("anna").unwrap();
    assert_eq!(prefs.preferred_category.as_deref(), Some("Investimenti"));
    assert_eq!(prefs.experience_level.as_deref(), Some("expert"));

    let recommendations = engine.personalized_recommendations("anna");
    assert_eq!(recommendations.len(), 2);
    assert!(recommendations[0].contains("Investimenti"));
}

#[test]
fn test_json_store_persists_between_engines() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        let mut engine = LearningEngine::new(Box::new(store));
        engine.record_interaction("bonifico estero", "Passo 1: apri Transazioni", Feedback::Positive, "", 200);
        engine.update_user_preferences("u1", UserPreferences {
            common_issues: Some(vec!["bonifici".to_string()]),
            ..Default::default()
        });
    }

    let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
    let engine = LearningEngine::new(Box::new(store));
    assert_eq!(engine.interactions().len(), 1);
    assert_eq!(engine.interactions()[0].category, "Transazioni");
    assert_eq!(engine.patterns().len(), 3);
    assert_eq!(engine.patterns()[1].usage_count, 1);
    assert_eq!(engine.knowledge_base().len(), 1);
    assert_eq!(engine.personalized_recommendations("u1").len(), 1);
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ai_learning_patterns.json"), "{{{").unwrap();
    std::fs::write(dir.path().join("ai_learning_interactions.json"), "[]").unwrap();

    let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
    let engine = LearningEngine::new(Box::new(store));
    assert_eq!(pattern_strings(&engine), seed_pattern_strings());
    assert!(engine.interactions().is_empty());
}

#[test]
fn test_sqlite_store_persists_between_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning.db");

    {
        let mut engine = LearningEngine::new(Box::new(SqliteStore::open(&path).unwrap()));
        engine.record_interaction("saldo conto", "Ecco il saldo", Feedback::Neutral, "", 90);
        engine.record_interaction("saldo conto", "Ecco il saldo", Feedback::Positive, "", 110);
    }

    let engine = LearningEngine::new(Box::new(SqliteStore::open(&path).unwrap()));
    let metrics = engine.learning_metrics();
    assert_eq!(metrics.total_interactions, 2);
    assert_eq!(metrics.popular_questions[0].count, 2);
    assert!(engine.interactions()[0].timestamp <= engine.interactions()[1].timestamp);
}

#[test]
fn test_export_import_round_trip() {
    let mut source = LearningEngine::in_memory();
    source.record_interaction("non riesco ad accedere", "Reimposta la password", Feedback::Positive, "login", 300);
    source.record_interaction("fondi azionari", "Ecco i fondi", Feedback::Neutral, "", 500);
    source.update_user_preferences("u7", UserPreferences {
        experience_level: Some("beginner".to_string()),
        ..Default::default()
    });

    let exported = source.export_learning_data().unwrap();
    let document: serde_json::Value = serde_json::from_str(&exported).unwrap();
    for key in ["interactions", "patterns", "knowledgeBase", "userPreferences", "metrics"] {
        assert!(document.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(document["metrics"]["totalInteractions"], 2);

    let mut target = LearningEngine::in_memory();
    target.import_learning_data(&exported).unwrap();

    assert_eq!(target.interactions(), source.interactions());
    assert_eq!(target.patterns().len(), source.patterns().len());
    for (imported, original) in target.patterns().iter().zip(source.patterns()) {
        assert_eq!(imported.pattern, original.pattern);
        assert_eq!(imported.usage_count, original.usage_count);
        assert!((imported.confidence - original.confidence).abs() < 1e-12);
        assert!((imported.success_rate - original.success_rate).abs() < 1e-12);
    }
    assert_eq!(target.knowledge_base(), source.knowledge_base());
    assert_eq!(target.user_preferences("u7"), source.user_preferences("u7"));
    assert_eq!(target.learning_metrics(), source.learning_metrics());
}
