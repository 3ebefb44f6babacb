use crate::mention::Mention;
use crate::rules::{Rule, RuleCategory, RuleSet};

/// The first rule that matched a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub label: String,
    pub category: RuleCategory,
    pub pattern: String,
}

pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Self {
        Classifier { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Text rules first, then location rules; the first hit wins and nothing
    /// after it is evaluated. `None` is the normal outcome for most mentions.
    pub fn classify(&self, mention: &Mention) -> Option<RuleMatch> {
        if let Some(hit) = first_match(self.rules.text_rules(), &mention.text, RuleCategory::Text) {
            return Some(hit);
        }

        let location = mention.location();
        first_match(self.rules.location_rules(), &location, RuleCategory::Location)
    }

    pub fn classify_label(&self, mention: &Mention) -> Option<String> {
        self.classify(mention).map(|hit| hit.label)
    }
}

fn first_match(rules: &[Rule], haystack: &str, category: RuleCategory) -> Option<RuleMatch> {
    let rule = rules.iter().find(|rule| rule.is_match(haystack))?;
    log::debug!(
        "{} rule '{}' matched, label '{}'",
        category,
        rule.pattern(),
        rule.label()
    );
    Some(RuleMatch {
        label: rule.label().to_string(),
        category,
        pattern: rule.pattern().to_string(),
    })
}
