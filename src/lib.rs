//! fin-assistant - Assistant Learning Library
//!
//! The learning/feedback engine behind the finance dashboard's assistant:
//! - Keyword classification of user questions into dashboard categories
//! - Adaptive keyword patterns with confidence and success-rate scores
//! - A knowledge base of category/keyword statistics and user preferences
//! - Dashboard metrics, improvement suggestions and recommendations
//! - Pluggable key-value persistence (JSON files, SQLite, memory)
//!
//! # Example
//!
//! ```
//! use fin_assistant::{Feedback, LearningEngine};
//!
//! let mut engine = LearningEngine::in_memory();
//! engine.record_interaction("Non riesco ad accedere", "Reimposta la password", Feedback::Positive, "", 120);
//! assert_eq!(engine.learning_metrics().total_interactions, 1);
//! ```

pub mod types;
pub mod config;
pub mod storage;
pub mod learning;
pub mod metrics;
pub mod server;
pub mod cli;

pub use config::Config;
pub use learning::{LearningEngine, LearningSnapshot};
pub use metrics::LearningMetrics;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use types::{Feedback, Interaction, KnowledgeEntry, Pattern, UserPreferences};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Assistant Learning Engine", NAME, VERSION)
}
