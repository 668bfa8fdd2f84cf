//! Dashboard metrics derived from the interaction log
//!
//! Everything here is a pure function of the log; nothing is cached between
//! calls.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Feedback, Interaction};

/// Entries kept in the top-N lists
pub const TOP_N: usize = 10;

/// Snapshot returned to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningMetrics {
    pub total_interactions: usize,
    pub positive_feedback: usize,
    pub negative_feedback: usize,
    pub average_satisfaction: f64,
    pub response_accuracy: f64,
    pub popular_questions: Vec<QuestionCount>,
    pub problem_categories: Vec<CategoryStats>,
    pub common_keywords: Vec<KeywordCount>,
    pub session_patterns: Vec<CategoryCount>,
    pub time_of_day: Vec<HourActivity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCount {
    pub question: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub average_satisfaction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourActivity {
    pub hour: u32,
    pub activity: usize,
}

impl LearningMetrics {
    /// Aggregate the full log
    pub fn from_interactions(interactions: &[Interaction]) -> Self {
        let total = interactions.len();

        Self {
            total_interactions: total,
            positive_feedback: interactions.iter().filter(|i| i.feedback == Feedback::Positive).count(),
            negative_feedback: interactions.iter().filter(|i| i.feedback == Feedback::Negative).count(),
            average_satisfaction: mean(interactions.iter().map(|i| f64::from(i.user_satisfaction))),
            response_accuracy: mean(interactions.iter().map(|i| f64::from(i.response_quality))) / 10.0,
            popular_questions: popular_questions(interactions),
            problem_categories: problem_categories(interactions),
            common_keywords: common_keywords(interactions),
            session_patterns: session_patterns(interactions),
            time_of_day: time_of_day(interactions),
        }
    }
}

/// Mean of the samples, 0 when there are none
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Occurrence counts in first-seen order
fn count_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match index.get(item) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }
    // Stable: ties keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn popular_questions(interactions: &[Interaction]) -> Vec<QuestionCount> {
    count_in_order(interactions.iter().map(|i| i.question.as_str()))
        .into_iter()
        .take(TOP_N)
        .map(|(question, count)| QuestionCount { question: question.to_string(), count })
        .collect()
}

fn problem_categories(interactions: &[Interaction]) -> Vec<CategoryStats> {
    count_in_order(interactions.iter().map(|i| i.category.as_str()))
        .into_iter()
        .map(|(category, count)| CategoryStats {
            category: category.to_string(),
            count,
            average_satisfaction: mean(
                interactions
                    .iter()
                    .filter(|i| i.category == category)
                    .map(|i| f64::from(i.user_satisfaction)),
            ),
        })
        .collect()
}

fn common_keywords(interactions: &[Interaction]) -> Vec<KeywordCount> {
    count_in_order(interactions.iter().flat_map(|i| i.keywords.iter().map(String::as_str)))
        .into_iter()
        .take(TOP_N)
        .map(|(keyword, count)| KeywordCount { keyword: keyword.to_string(), count })
        .collect()
}

/// Per-category activity, using the category stored at record time
fn session_patterns(interactions: &[Interaction]) -> Vec<CategoryCount> {
    count_in_order(interactions.iter().map(|i| i.category.as_str()))
        .into_iter()
        .map(|(category, count)| CategoryCount { category: category.to_string(), count })
        .collect()
}

fn time_of_day(interactions: &[Interaction]) -> Vec<HourActivity> {
    let mut hours = [0usize; 24];
    for interaction in interactions {
        hours[interaction.timestamp.hour() as usize] += 1;
    }
    hours
        .iter()
        .enumerate()
        .map(|(hour, &activity)| HourActivity { hour: hour as u32, activity })
        .collect()
}
