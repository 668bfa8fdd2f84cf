//! Keyword classifier
//!
//! Maps free text to a category label and a short keyword list using a fixed,
//! ordered category table and an Italian stop-word filter.

use serde::{Deserialize, Serialize};

/// Category returned when no table entry matches
pub const DEFAULT_CATEGORY: &str = "Generale";

/// Maximum number of keywords kept per text
pub const MAX_KEYWORDS: usize = 5;

/// Maximum number of follow-up prompts per exchange
pub const MAX_FOLLOW_UPS: usize = 3;

/// Category table. First match wins, so order matters: "password per il login"
/// must land in `Accesso` even if later entries would also match.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Accesso", &["login", "accesso", "accedere", "password", "entrare", "autenticazione", "credenziali"]),
    ("Transazioni", &["transazione", "transazioni", "pagamento", "pagare", "pago", "bonifico", "movimenti"]),
    ("Conti", &["conto", "conti", "saldo", "estratto"]),
    ("Investimenti", &["fondo", "fondi", "azioni", "obbligazioni", "investimento", "portafoglio"]),
    ("Report", &["report", "rapporto", "grafico", "statistiche", "mensile", "analisi"]),
    ("Impostazioni", &["impostazioni", "profilo", "preferenze", "notifiche", "lingua"]),
    ("Errori", &["errore", "problema", "bug", "non funziona", "bloccato"]),
];

/// Tokens of length <= 2 are dropped before this list is consulted
const STOP_WORDS: &[&str] = &[
    "che", "per", "con", "del", "della", "dello", "dei", "degli", "delle", "dal", "dalla",
    "dai", "dalle", "nel", "nella", "nei", "nelle", "sul", "sulla", "sui", "sulle", "una",
    "uno", "gli", "come", "cosa", "sono", "questo", "questa", "quello", "quella", "non",
    "mio", "mia", "miei", "mie", "tuo", "tua", "suo", "sua", "anche", "più", "molto",
    "dove", "quando", "perché", "qual", "quale", "alla", "allo", "agli", "alle", "hai",
    "hanno", "posso", "voglio", "vorrei",
];

/// Category and keywords derived from one text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub keywords: Vec<String>,
}

/// Classify a text in one pass
pub fn classify(text: &str) -> Classification {
    Classification {
        category: categorize(text),
        keywords: extract_keywords(text),
    }
}

/// First five non-stop-word tokens longer than two characters, in order
pub fn extract_keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Category of the first table entry with a keyword contained in `text`
pub fn categorize(text: &str) -> String {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(category, _)| category.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// All known category labels, in table order, followed by the default
pub fn categories() -> Vec<&'static str> {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, _)| *category)
        .chain(std::iter::once(DEFAULT_CATEGORY))
        .collect()
}

/// Follow-up prompts offered after a response
pub fn generate_follow_ups(question: &str, response: &str) -> Vec<String> {
    let question = question.to_lowercase();
    let response = response.to_lowercase();
    let mut follow_ups = Vec::new();

    if question.contains("come") {
        follow_ups.push("Vuoi che ti guidi passo dopo passo?".to_string());
    }
    if question.contains("problema") || question.contains("errore") {
        follow_ups.push("Il problema persiste dopo aver seguito queste indicazioni?".to_string());
    }
    if response.contains("passo") {
        follow_ups.push("Hai bisogno di aiuto con un passaggio specifico?".to_string());
    }

    follow_ups.truncate(MAX_FOLLOW_UPS);
    follow_ups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_first_match_wins() {
        assert_eq!(categorize("Ho dimenticato la password per il login"), "Accesso");
        // "errore" also appears, but Accesso is listed first
        assert_eq!(categorize("errore di accesso"), "Accesso");
        assert_eq!(categorize("REPORT mensile"), "Report");
        assert_eq!(categorize("buongiorno"), DEFAULT_CATEGORY);
        assert_eq!(categorize(""), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_extract_keywords_filters_and_limits() {
        assert_eq!(
            extract_keywords("Non riesco ad accedere al mio conto"),
            vec!["riesco", "accedere", "conto"]
        );

        let many = extract_keywords("uno due tre quattro cinque sei sette otto nove dieci");
        assert_eq!(many.len(), MAX_KEYWORDS);
        assert_eq!(many[0], "due");

        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn test_extract_keywords_keeps_duplicates() {
        assert_eq!(extract_keywords("saldo saldo saldo"), vec!["saldo", "saldo", "saldo"]);
    }

    #[test]
    fn test_follow_ups() {
        let follow_ups = generate_follow_ups("Come risolvo questo errore?", "Primo passo: riavvia");
        assert_eq!(follow_ups.len(), 3);

        assert!(generate_follow_ups("saldo", "ecco il saldo").is_empty());
    }

    #[test]
    fn test_categories_listing() {
        let all = categories();
        assert_eq!(all.first(), Some(&"Accesso"));
        assert_eq!(all.last(), Some(&DEFAULT_CATEGORY));
    }
}
