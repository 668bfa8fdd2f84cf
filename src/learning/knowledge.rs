//! Knowledge base of category + keyword statistics

use std::collections::BTreeMap;

use crate::types::{Interaction, KnowledgeEntry};

/// Entries keyed by `category:sorted,keywords`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    entries: BTreeMap<String, KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, KnowledgeEntry)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    pub fn get(&self, key: &str) -> Option<&KnowledgeEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &KnowledgeEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries as `(key, entry)` pairs, ordered by key
    pub fn to_pairs(&self) -> Vec<(String, KnowledgeEntry)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Fold one interaction into its entry.
    ///
    /// The running average is `(old + sample) / 2`, which weights recent
    /// samples more heavily than a true mean.
    pub fn record(&mut self, interaction: &Interaction) {
        let key = entry_key(&interaction.category, &interaction.keywords);
        let sample = f64::from(interaction.user_satisfaction);

        self.entries
            .entry(key)
            .and_modify(|entry| {
                entry.count += 1;
                entry.average_satisfaction = (entry.average_satisfaction + sample) / 2.0;
                entry.last_seen = interaction.timestamp;
            })
            .or_insert_with(|| KnowledgeEntry {
                count: 1,
                average_satisfaction: sample,
                first_seen: interaction.timestamp,
                last_seen: interaction.timestamp,
            });
    }

    /// Keys whose category prefix equals `category`, most frequent first
    pub fn top_for_category(&self, category: &str, limit: usize) -> Vec<(&str, &KnowledgeEntry)> {
        let prefix = format!("{}:", category);
        let mut matching: Vec<(&str, &KnowledgeEntry)> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        matching.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        matching.truncate(limit);
        matching
    }
}

/// `category:kw1,kw2` with keywords sorted ascending
pub fn entry_key(category: &str, keywords: &[String]) -> String {
    let mut sorted: Vec<&str> = keywords.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}:{}", category, sorted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feedback;
    use chrono::Utc;

    fn interaction(keywords: &[&str], feedback: Feedback) -> Interaction {
        Interaction {
            id: "kb".to_string(),
            question: keywords.join(" "),
            feedback,
            response_quality: 5,
            user_satisfaction: feedback.satisfaction(),
            timestamp: Utc::now(),
            context: String::new(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            category: "Conti".to_string(),
            response_time: 0,
            follow_up_questions: vec![],
            resolution_success: feedback.is_positive(),
        }
    }

    #[test]
    fn test_entry_key_sorts_keywords() {
        let keywords = vec!["saldo".to_string(), "conto".to_string()];
        assert_eq!(entry_key("Conti", &keywords), "Conti:conto,saldo");
        assert_eq!(entry_key("Generale", &[]), "Generale:");
    }

    #[test]
    fn test_record_running_average() {
        let mut kb = KnowledgeBase::default();
        kb.record(&interaction(&["saldo", "conto"], Feedback::Positive));
        kb.record(&interaction(&["conto", "saldo"], Feedback::Negative));
        kb.record(&interaction(&["saldo", "conto"], Feedback::Neutral));

        let entry = kb.get("Conti:conto,saldo").unwrap();
        assert_eq!(entry.count, 3);
        // ((5 + 1) / 2 + 3) / 2
        assert!((entry.average_satisfaction - 3.0).abs() < 1e-9);
        assert!(entry.first_seen <= entry.last_seen);
        assert_eq!(kb.len(), 1);
    }

    #[test]
    fn test_top_for_category() {
        let mut kb = KnowledgeBase::default();
        kb.record(&interaction(&["saldo"], Feedback::Positive));
        kb.record(&interaction(&["estratto"], Feedback::Positive));
        kb.record(&interaction(&["estratto"], Feedback::Positive));

        let top = kb.top_for_category("Conti", 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "Conti:estratto");
        assert!(kb.top_for_category("Report", 5).is_empty());
    }
}
