//! Learning system
//!
//! Classifies incoming questions, maintains adaptive keyword patterns and a
//! knowledge base of category/keyword statistics, and orchestrates both
//! through the `LearningEngine`.

pub mod classifier;
pub mod engine;
pub mod knowledge;
pub mod patterns;

pub use classifier::{categorize, classify, extract_keywords, generate_follow_ups, Classification};
pub use engine::{response_quality, LearningEngine, LearningSnapshot};
pub use knowledge::KnowledgeBase;
pub use patterns::PatternStore;
