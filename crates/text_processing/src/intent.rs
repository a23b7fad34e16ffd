//! Intent classification
//!
//! Maps an utterance plus recent conversation context to one label from a
//! closed set. The rule table is explicit and ordered so priority is a
//! visible contract: `translation_request` > `greeting` > `question` >
//! `general_conversation`, first match wins, no match yields `unknown`.
//!
//! Classification is total and deterministic: it always terminates with a
//! label, never errors, and never calls out of process.
//!
//! # Example
//!
//! ```
//! use polyglot_text_processing::IntentClassifier;
//! use polyglot_core::IntentLabel;
//!
//! let classifier = IntentClassifier::new();
//! assert_eq!(classifier.classify("Hello, how are you?", &[]), IntentLabel::Greeting);
//! ```

use polyglot_core::{IntentLabel, Language, Turn};
use unicode_segmentation::UnicodeSegmentation;

/// One row of the rule table
///
/// A rule matches when any keyword appears as a whole token, any phrase
/// appears as a whole-word subsequence, or (`matches_question_mark`) the
/// raw utterance ends in a question mark.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub label: IntentLabel,
    pub keywords: &'static [&'static str],
    pub phrases: &'static [&'static str],
    pub matches_question_mark: bool,
}

/// Default rule table, highest priority first
const DEFAULT_RULES: &[IntentRule] = &[
    IntentRule {
        label: IntentLabel::TranslationRequest,
        keywords: &["translate", "translation", "meaning"],
        phrases: &["what does"],
        matches_question_mark: false,
    },
    IntentRule {
        label: IntentLabel::Greeting,
        keywords: &["hi", "hello", "hey", "namaste"],
        phrases: &["good morning", "good afternoon", "good evening"],
        matches_question_mark: false,
    },
    IntentRule {
        label: IntentLabel::Question,
        keywords: &["what", "when", "where", "why", "how", "who", "which"],
        phrases: &[],
        matches_question_mark: true,
    },
    IntentRule {
        label: IntentLabel::GeneralConversation,
        keywords: &["tell", "explain", "describe"],
        phrases: &["talk about"],
        matches_question_mark: false,
    },
];

/// Rule-based intent classifier
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// Classifier with the default rule table
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }

    /// Classifier with a custom ordered rule table
    ///
    /// Rules are evaluated in the given order; keep the highest-priority
    /// label first.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Classify an utterance given the session's recent turns
    ///
    /// `recent` is the bounded context window, oldest first. Context is
    /// consulted for one follow-up rule: a bare language name directly
    /// after a translation request stays a translation request ("translate
    /// good morning" ... "in French?").
    pub fn classify(&self, utterance: &str, recent: &[Turn]) -> IntentLabel {
        let ends_with_question_mark = utterance.trim_end().ends_with('?');
        let tokens = normalize(utterance);

        if self.is_translation_follow_up(&tokens, recent) {
            tracing::debug!(utterance, "follow-up classified as translation_request");
            return IntentLabel::TranslationRequest;
        }

        for rule in &self.rules {
            if rule_matches(rule, &tokens, ends_with_question_mark) {
                tracing::debug!(utterance, intent = %rule.label, "intent matched");
                return rule.label;
            }
        }
        IntentLabel::Unknown
    }

    /// A short utterance naming only languages, right after a translation
    /// request, continues that request
    fn is_translation_follow_up(&self, tokens: &[String], recent: &[Turn]) -> bool {
        let Some(last) = recent.last() else {
            return false;
        };
        if last.intent != IntentLabel::TranslationRequest || tokens.is_empty() || tokens.len() > 3 {
            return false;
        }
        tokens
            .iter()
            .all(|t| t == "in" || t == "to" || Language::parse(t).is_some())
            && tokens.iter().any(|t| Language::parse(t).is_some())
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-fold and split into word tokens, dropping punctuation
fn normalize(utterance: &str) -> Vec<String> {
    utterance
        .to_lowercase()
        .unicode_words()
        .map(str::to_string)
        .collect()
}

fn rule_matches(rule: &IntentRule, tokens: &[String], ends_with_question_mark: bool) -> bool {
    if rule.matches_question_mark && ends_with_question_mark {
        return true;
    }
    if tokens.iter().any(|t| rule.keywords.contains(&t.as_str())) {
        return true;
    }
    rule.phrases.iter().any(|phrase| {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        tokens
            .windows(words.len())
            .any(|w| w.iter().map(String::as_str).eq(words.iter().copied()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polyglot_core::BackendUsage;

    fn turn_with_intent(intent: IntentLabel) -> Turn {
        let now = Utc::now();
        Turn {
            sequence: 0,
            input: "translate good morning".into(),
            input_language: Language::English,
            intent,
            response: "suprabhat".into(),
            response_language: Language::Hindi,
            requested_at: now,
            responded_at: now,
            backends: BackendUsage::default(),
            fallback_occurred: false,
            degraded: false,
        }
    }

    #[test]
    fn test_translation_keyword_wins_over_question() {
        let classifier = IntentClassifier::new();
        // "what does" is also interrogative; translation has priority
        assert_eq!(
            classifier.classify("What does namaste mean?", &[]),
            IntentLabel::TranslationRequest
        );
    }

    #[test]
    fn test_translation_case_and_punctuation_insensitive() {
        let classifier = IntentClassifier::new();
        for utterance in ["TRANSLATE this", "translate this!!!", "  Translation, please."] {
            assert_eq!(
                classifier.classify(utterance, &[]),
                IntentLabel::TranslationRequest,
                "failed for {:?}",
                utterance
            );
        }
    }

    #[test]
    fn test_greeting_fires_before_question() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("Hello, how are you?", &[]),
            IntentLabel::Greeting
        );
    }

    #[test]
    fn test_question_by_marker_and_by_word() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("where is the station", &[]),
            IntentLabel::Question
        );
        assert_eq!(
            classifier.classify("you are coming tomorrow?", &[]),
            IntentLabel::Question
        );
    }

    #[test]
    fn test_general_conversation() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("tell me a story", &[]),
            IntentLabel::GeneralConversation
        );
        assert_eq!(
            classifier.classify("let's talk about music", &[]),
            IntentLabel::GeneralConversation
        );
    }

    #[test]
    fn test_unknown_default() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("mangoes are ripe", &[]), IntentLabel::Unknown);
        assert_eq!(classifier.classify("", &[]), IntentLabel::Unknown);
    }

    #[test]
    fn test_no_substring_false_positives() {
        let classifier = IntentClassifier::new();
        // "hi" inside "this" must not trigger greeting
        assert_eq!(
            classifier.classify("this is fine", &[]),
            IntentLabel::Unknown
        );
    }

    #[test]
    fn test_language_name_follow_up_continues_translation() {
        let classifier = IntentClassifier::new();
        let recent = vec![turn_with_intent(IntentLabel::TranslationRequest)];
        assert_eq!(
            classifier.classify("in French?", &recent),
            IntentLabel::TranslationRequest
        );
        // same utterance without the preceding translation turn is a question
        assert_eq!(classifier.classify("in French?", &[]), IntentLabel::Question);
        // non-language follow-up does not continue the request
        let greeting_context = vec![turn_with_intent(IntentLabel::Greeting)];
        assert_eq!(
            classifier.classify("in French?", &greeting_context),
            IntentLabel::Question
        );
    }
}
