//! Metrics and analysis module
//!
//! This module provides:
//! - Dashboard metrics aggregated from the interaction log
//! - Improvement suggestions for low-confidence patterns, unhappy categories
//!   and slow responses
//! - Personalized recommendations from stored user preferences

pub mod aggregate;
pub mod analysis;

pub use aggregate::{
    CategoryCount, CategoryStats, HourActivity, KeywordCount, LearningMetrics, QuestionCount,
};
pub use analysis::{improvement_suggestions, personalized_recommendations};
