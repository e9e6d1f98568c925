//! Fallback classifier: decides from the API agent's response text whether
//! the SQL agent has to run.
//!
//! This is a keyword heuristic, not a model. It misses refusals phrased in
//! other words ("that's outside what I can see"), fires on incidental use of
//! words like "report", and does not normalize typographic apostrophes, so
//! "I don’t have" does not match "i don't have".

/// Phrases whose presence in an API agent response signals that the request
/// needs the SQL agent: either the API agent could not answer, or the
/// question is analytical.
pub const FALLBACK_INDICATORS: &[&str] = &[
    "i don't have",
    "i cannot",
    "i'm unable to",
    "not available",
    "cannot provide",
    "don't have access",
    "analytics",
    "statistics",
    "query the database",
    "historical data",
    "aggregate",
    "report",
];

/// Case-insensitive substring matcher over a phrase table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackClassifier {
    indicators: Vec<String>,
}

impl Default for FallbackClassifier {
    fn default() -> Self {
        Self::with_indicators(FALLBACK_INDICATORS.iter().copied())
    }
}

impl FallbackClassifier {
    /// Build a classifier over a custom phrase table.
    ///
    /// Phrases are lower-cased; empty phrases are dropped since they would
    /// match every response.
    pub fn with_indicators<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classifier = Self { indicators: vec![] };
        classifier.extend(indicators);
        classifier
    }

    /// Add phrases to the table.
    pub fn extend<I, S>(&mut self, indicators: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in indicators {
            let phrase = phrase.as_ref().trim().to_lowercase();
            if !phrase.is_empty() && !self.indicators.contains(&phrase) {
                self.indicators.push(phrase);
            }
        }
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Whether a response requires the SQL agent. Absent or empty text never does.
    pub fn is_fallback(&self, text: Option<&str>) -> bool {
        match text {
            Some(text) if !text.is_empty() => {
                let lower = text.to_lowercase();
                self.indicators.iter().any(|p| lower.contains(p.as_str()))
            }
            _ => false,
        }
    }

    /// All phrases found in `text`, in table order.
    pub fn matched_indicators(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.indicators
            .iter()
            .filter(|p| lower.contains(p.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// Check a response against the default phrase table.
pub fn needs_sql_fallback(text: &str) -> bool {
    FallbackClassifier::default().is_fallback(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_indicator_triggers() {
        for phrase in FALLBACK_INDICATORS {
            let text = format!("Well, {} for sure.", phrase.to_uppercase());
            assert!(needs_sql_fallback(&text), "should match: {}", text);
            assert!(FallbackClassifier::default().is_fallback(Some(&text)));
        }
    }

    #[test]
    fn test_fallback_examples() {
        let cases = [
            ("I don't have access to that information", true),
            ("I cannot provide analytics data", true),
            ("You need analytics for this request", true),
            ("Let me query the database for statistics", true),
            ("Here are the historical data results", true),
            ("I'll aggregate the results for you", true),
            ("Here's the item you requested", false),
            ("The auction has been created successfully", false),
        ];

        let classifier = FallbackClassifier::default();
        for (text, expected) in cases {
            assert_eq!(needs_sql_fallback(text), expected, "{}", text);
            assert_eq!(classifier.is_fallback(Some(text)), expected, "{}", text);
        }
    }

    #[test]
    fn test_empty_and_absent_text() {
        let classifier = FallbackClassifier::default();
        assert!(!classifier.is_fallback(None));
        assert!(!classifier.is_fallback(Some("")));
        assert!(!needs_sql_fallback(""));
    }

    #[test]
    fn test_no_partial_word_matching() {
        // "reports" contains "report"; "can not" does not contain "cannot"
        assert!(needs_sql_fallback("Monthly reports are ready"));
        assert!(!needs_sql_fallback("I can not do that"));
        assert!(!needs_sql_fallback("Statistic"));
    }

    #[test]
    fn test_typographic_apostrophe_not_normalized() {
        assert!(!needs_sql_fallback("I don\u{2019}t have that"));
    }

    #[test]
    fn test_multiple_matches_still_single_bool() {
        let text = "I cannot provide that, please query the database for historical data";
        let classifier = FallbackClassifier::default();
        assert!(classifier.is_fallback(Some(text)));
        assert_eq!(
            classifier.matched_indicators(text),
            vec!["i cannot", "cannot provide", "query the database", "historical data"]
        );
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = FallbackClassifier::default();
        let text = "Here are all catalogue items: [...]";
        let first = classifier.is_fallback(Some(text));
        let second = classifier.is_fallback(Some(text));
        assert_eq!(first, second);
        assert!(!first);
    }

    #[test]
    fn test_custom_indicators_are_lowercased_and_deduplicated() {
        let mut classifier = FallbackClassifier::with_indicators(["Out Of Scope", "", "  "]);
        classifier.extend(["out of scope", "TREND"]);
        assert_eq!(classifier.indicators(), &["out of scope", "trend"]);
        assert!(classifier.is_fallback(Some("That is OUT OF SCOPE here")));
        assert!(!classifier.is_fallback(Some("I cannot help")));
    }

    #[test]
    fn test_free_function_agrees_with_default_classifier() {
        let classifier = FallbackClassifier::default();
        for text in ["", "REPORT attached", "Item 4 sold", "I'M UNABLE TO do that", "aggregated"] {
            assert_eq!(needs_sql_fallback(text), classifier.is_fallback(Some(text)), "{}", text);
            assert_eq!(
                needs_sql_fallback(text),
                !classifier.matched_indicators(text).is_empty(),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_default_table_matches_constant() {
        let classifier = FallbackClassifier::default();
        assert_eq!(classifier.indicators().len(), FALLBACK_INDICATORS.len());
    }
}
