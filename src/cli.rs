//! CLI interface for fin-assistant

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, Config, StorageBackend};
use crate::learning::{classifier, LearningEngine};
use crate::storage;
use crate::types::{Feedback, UserPreferences};

#[derive(Parser)]
#[command(name = "fin-assistant")]
#[command(about = "Learning and feedback engine for the finance dashboard assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Override the configured storage backend
    #[arg(long, global = true, value_enum)]
    backend: Option<StorageBackend>,

    /// Override the storage location (directory for json, file for sqlite)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one question/response exchange with its feedback
    Record {
        /// The user's question
        #[arg(short, long)]
        question: String,
        /// The assistant's response
        #[arg(short, long)]
        response: String,
        /// Feedback: positive, negative or neutral
        #[arg(short, long)]
        feedback: Feedback,
        /// Free-text context (page, section, ...)
        #[arg(short, long, default_value = "")]
        context: String,
        /// Response latency in milliseconds
        #[arg(short, long, default_value = "0")]
        latency_ms: u64,
    },
    /// Show learning metrics
    Metrics {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show improvement suggestions
    Suggestions,
    /// Show personalized recommendations for a user
    Recommend {
        /// User ID
        user_id: String,
    },
    /// Update a user's preferences
    Prefs {
        /// User ID
        user_id: String,
        /// Preferred category
        #[arg(long)]
        preferred_category: Option<String>,
        /// Common issue (repeatable)
        #[arg(long = "issue")]
        common_issues: Vec<String>,
        /// Experience level (beginner, intermediate, expert)
        #[arg(long)]
        experience_level: Option<String>,
    },
    /// Classify a text without recording it
    Classify {
        /// Text to classify
        text: String,
    },
    /// Export all learning data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all learning data with a previous export
    Import {
        /// Export file to load
        file: PathBuf,
    },
    /// Delete all learning data and restore the built-in patterns
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Show the effective configuration
    Config,
}

/// Run CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(backend) = cli.backend {
        config.storage.backend = backend;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.path = Some(dir);
    }

    match cli.command {
        Commands::Record { question, response, feedback, context, latency_ms } => {
            let mut engine = open_engine(&config)?;
            engine.record_interaction(&question, &response, feedback, &context, latency_ms);
            let last = engine.interactions().last().context("Interaction was not recorded")?;
            println!("Recorded [{}] quality {}/10, satisfaction {}/5", last.category, last.response_quality, last.user_satisfaction);
            for follow_up in &last.follow_up_questions {
                println!("  → {}", follow_up);
            }
        }
        Commands::Metrics { json } => {
            let engine = open_engine(&config)?;
            let metrics = engine.learning_metrics();
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                print_metrics(&metrics);
            }
        }
        Commands::Suggestions => {
            let engine = open_engine(&config)?;
            let suggestions = engine.improvement_suggestions();
            if suggestions.is_empty() {
                println!("Nessun miglioramento necessario: l'assistente sta funzionando bene.");
            } else {
                for suggestion in &suggestions {
                    println!("• {}", suggestion);
                }
            }
        }
        Commands::Recommend { user_id } => {
            let engine = open_engine(&config)?;
            let recommendations = engine.personalized_recommendations(&user_id);
            if recommendations.is_empty() {
                println!("No preferences stored for user '{}'", user_id);
            } else {
                for recommendation in &recommendations {
                    println!("• {}", recommendation);
                }
            }
        }
        Commands::Prefs { user_id, preferred_category, common_issues, experience_level } => {
            let mut engine = open_engine(&config)?;
            let partial = UserPreferences {
                preferred_category,
                common_issues: if common_issues.is_empty() { None } else { Some(common_issues) },
                experience_level,
                ..Default::default()
            };
            engine.update_user_preferences(&user_id, partial);
            let merged = engine.user_preferences(&user_id).cloned().unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        Commands::Classify { text } => {
            let classification = classifier::classify(&text);
            println!("Category: {}", classification.category);
            println!("Keywords: {}", classification.keywords.join(", "));
        }
        Commands::Export { output } => {
            let engine = open_engine(&config)?;
            let json = engine.export_learning_data()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Exported learning data to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut engine = open_engine(&config)?;
            engine.import_learning_data(&json)?;
            println!(
                "Imported {} interactions and {} patterns",
                engine.interactions().len(),
                engine.patterns().len()
            );
        }
        Commands::Reset { yes } => {
            if !yes && !confirm("Delete all learning data?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let mut engine = open_engine(&config)?;
            engine.reset_learning_data();
            println!("Learning data reset.");
        }
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            let engine = open_engine(&config)?;
            crate::server::start(config, engine).await?;
        }
        Commands::Config => {
            config::show_config(&config)?;
        }
    }

    Ok(())
}

/// Build the engine on the configured storage backend
fn open_engine(config: &Config) -> Result<LearningEngine> {
    let data_dir = config::data_dir()?;
    let store = storage::open_store(&config.storage, &data_dir)?;
    Ok(LearningEngine::with_config(store, config.learning.clone()))
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sì"))
}

fn print_metrics(metrics: &crate::metrics::LearningMetrics) {
    println!("Learning Metrics");
    println!("================");
    println!("Interactions:      {}", metrics.total_interactions);
    println!("Positive feedback: {}", metrics.positive_feedback);
    println!("Negative feedback: {}", metrics.negative_feedback);
    println!("Avg satisfaction:  {:.2}/5", metrics.average_satisfaction);
    println!("Response accuracy: {:.0}%", metrics.response_accuracy * 100.0);

    if !metrics.popular_questions.is_empty() {
        println!();
        println!("Popular questions:");
        for q in &metrics.popular_questions {
            println!("  {:>3}× {}", q.count, q.question);
        }
    }

    if !metrics.problem_categories.is_empty() {
        println!();
        println!("Categories:");
        for c in &metrics.problem_categories {
            println!("  {:<14} {:>4} interactions, {:.1}/5", c.category, c.count, c.average_satisfaction);
        }
    }

    if !metrics.common_keywords.is_empty() {
        println!();
        let keywords: Vec<String> = metrics
            .common_keywords
            .iter()
            .map(|k| format!("{} ({})", k.keyword, k.count))
            .collect();
        println!("Keywords: {}", keywords.join(", "));
    }

    let busiest = metrics.time_of_day.iter().max_by_key(|h| h.activity);
    if let Some(hour) = busiest.filter(|h| h.activity > 0) {
        println!();
        println!("Busiest hour (UTC): {:02}:00 ({} interactions)", hour.hour, hour.activity);
    }
}
