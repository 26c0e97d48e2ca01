//! Text simplification - shorter page text for early readers.
//!
//! Simplification is an ordered list of regex rewrite rules. The primary
//! rules run once, in order, on any text of at least [`MIN_SIMPLIFY_LEN`]
//! characters. If the result is still longer than [`SECONDARY_PASS_LEN`]
//! the secondary rules run as well.

use regex::Regex;
use std::sync::LazyLock;

/// Texts shorter than this are returned unchanged.
pub const MIN_SIMPLIFY_LEN: usize = 70;

/// Texts still longer than this after the primary pass get the secondary pass.
pub const SECONDARY_PASS_LEN: usize = 150;

/// How many matches of a rule are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Only the first match.
    First,
    /// Every match.
    All,
}

/// A single (pattern, replacement) rewrite.
#[derive(Debug, Clone)]
pub struct SimplifyRule {
    pattern: Regex,
    replacement: String,
    scope: RuleScope,
}

impl SimplifyRule {
    pub fn new(
        pattern: &str,
        replacement: impl Into<String>,
        scope: RuleScope,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
            scope,
        })
    }

    /// Apply this rule to `text`.
    pub fn apply(&self, text: &str) -> String {
        match self.scope {
            RuleScope::First => self
                .pattern
                .replace(text, self.replacement.as_str())
                .into_owned(),
            RuleScope::All => self
                .pattern
                .replace_all(text, self.replacement.as_str())
                .into_owned(),
        }
    }
}

// (pattern, replacement, scope) for the primary pass, applied top to bottom.
const PRIMARY_RULES: &[(&str, &str, RuleScope)] = &[
    // Story starters
    (r"(?i)Once upon a time,\s+", "", RuleScope::First),
    (r"(?i)there was\s+", "", RuleScope::First),
    (r"(?i)there were\s+", "", RuleScope::First),
    (r"(?i)One day,\s+", "", RuleScope::First),
    (r"(?i)Long ago,\s+", "", RuleScope::First),
    (r"(?i)In the olden days,\s+", "", RuleScope::First),
    (r"(?i)A long time ago,\s+", "", RuleScope::First),
    // Character descriptions
    (r"(?i)that looked different", "different", RuleScope::First),
    (r"(?i)looking at me", "watches me", RuleScope::First),
    (r"(?i)The itsy bitsy spider", "Itsy spider", RuleScope::First),
    (r"(?i)very hungry", "hungry", RuleScope::First),
    (r"(?i)Little Red Riding Hood", "Red Hood", RuleScope::First),
    (r"(?i)There was once", "Once", RuleScope::First),
    // Verbose expressions
    (r"(?i)in order to", "to", RuleScope::First),
    (r"(?i)as a result of", "because of", RuleScope::First),
    (r"(?i)due to the fact that", "because", RuleScope::First),
    (r"(?i)at this point in time", "now", RuleScope::First),
    (r"(?i)for the purpose of", "to", RuleScope::First),
    (r"(?i)in the event that", "if", RuleScope::First),
    // Story phrases
    (r"(?i)lived happily ever after", "lived happily", RuleScope::First),
    (r"(?i)as quick as lightning", "very quickly", RuleScope::First),
    (r"(?i)bright as the sun", "very bright", RuleScope::First),
    (r"(?i)suddenly realized", "realized", RuleScope::First),
    // Intensifiers
    (r"(?i)\b(very|really|extremely|absolutely)\s+", "", RuleScope::All),
    // One sentence per line
    (r"([.!?])\s+([A-Z])", "${1}\n${2}", RuleScope::All),
];

const SECONDARY_RULES: &[(&str, &str, RuleScope)] = &[
    (
        r"(?i)\b(however|nevertheless|furthermore|consequently|additionally|moreover)\b",
        "",
        RuleScope::All,
    ),
    (r"(?i)\b(that is to say|in other words)\b", "", RuleScope::All),
];

static STANDARD: LazyLock<TextSimplifier> = LazyLock::new(|| TextSimplifier {
    primary: compile(PRIMARY_RULES),
    secondary: compile(SECONDARY_RULES),
});

fn compile(rules: &[(&str, &str, RuleScope)]) -> Vec<SimplifyRule> {
    rules
        .iter()
        .filter_map(|(pattern, replacement, scope)| {
            SimplifyRule::new(pattern, *replacement, *scope)
                .map_err(|e| log::error!("Bad simplification rule {pattern:?}: {e}"))
                .ok()
        })
        .collect()
}

/// Ordered rule engine producing simplified page text.
#[derive(Debug, Clone, Default)]
pub struct TextSimplifier {
    primary: Vec<SimplifyRule>,
    secondary: Vec<SimplifyRule>,
}

impl TextSimplifier {
    /// Create a simplifier with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule set.
    pub fn standard() -> &'static TextSimplifier {
        &STANDARD
    }

    /// Append a rule to the primary pass.
    pub fn with_primary_rule(mut self, rule: SimplifyRule) -> Self {
        self.primary.push(rule);
        self
    }

    /// Append a rule to the secondary pass.
    pub fn with_secondary_rule(mut self, rule: SimplifyRule) -> Self {
        self.secondary.push(rule);
        self
    }

    pub fn rule_count(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    /// Simplify `text`.
    pub fn simplify(&self, text: &str) -> String {
        if text.chars().count() < MIN_SIMPLIFY_LEN {
            return text.to_string();
        }

        let simplified = self
            .primary
            .iter()
            .fold(text.to_string(), |acc, rule| rule.apply(&acc));
        let simplified = simplified.trim().to_string();

        if simplified.chars().count() > SECONDARY_PASS_LEN {
            self.secondary
                .iter()
                .fold(simplified, |acc, rule| rule.apply(&acc))
        } else {
            simplified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_compile() {
        assert_eq!(
            TextSimplifier::standard().rule_count(),
            PRIMARY_RULES.len() + SECONDARY_RULES.len()
        );
    }

    #[test]
    fn test_short_text_unchanged() {
        let text = "Once upon a time, a cat sat.";
        assert_eq!(TextSimplifier::standard().simplify(text), text);
    }

    #[test]
    fn test_story_starter_and_names() {
        let text = "Once upon a time, Little Red Riding Hood walked to her grandmother's house in the woods.";
        let simplified = TextSimplifier::standard().simplify(text);
        assert_eq!(
            simplified,
            "Red Hood walked to her grandmother's house in the woods."
        );
    }

    #[test]
    fn test_intensifiers_removed_everywhere() {
        let text = "The wolf was very big and really scary, and the house was extremely far away from here.";
        let simplified = TextSimplifier::standard().simplify(text);
        assert_eq!(
            simplified,
            "The wolf was big and scary, and the house was far away from here."
        );
    }

    #[test]
    fn test_sentences_split_onto_lines() {
        let text = "The caterpillar ate one apple on Monday. He was still hungry! So he ate two pears.";
        let simplified = TextSimplifier::standard().simplify(text);
        assert_eq!(
            simplified,
            "The caterpillar ate one apple on Monday.\nHe was still hungry!\nSo he ate two pears."
        );
    }

    #[test]
    fn test_phrase_rule_replaces_first_match_only() {
        let rule = SimplifyRule::new(r"(?i)in order to", "to", RuleScope::First).unwrap();
        assert_eq!(
            rule.apply("In order to win, in order to play"),
            "to win, in order to play"
        );
    }

    #[test]
    fn test_secondary_pass_only_for_long_text() {
        let simplifier = TextSimplifier::new()
            .with_secondary_rule(SimplifyRule::new(r"(?i)\bmoreover\b", "", RuleScope::All).unwrap());

        let medium = "moreover ".repeat(10);
        assert_eq!(simplifier.simplify(&medium), medium.trim());

        let long = "moreover word ".repeat(12);
        assert!(!simplifier.simplify(&long).contains("moreover"));
    }
}
