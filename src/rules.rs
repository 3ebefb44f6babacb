use crate::config::{RuleSpec, RulesConfig};
use regex::{Regex, RegexBuilder};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid {category} rule pattern '{pattern}' (label '{label}'): {source}")]
    InvalidPattern {
        category: RuleCategory,
        pattern: String,
        label: String,
        source: regex::Error,
    },
    #[error("{category} rule with pattern '{pattern}' has an empty label")]
    EmptyLabel {
        category: RuleCategory,
        pattern: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Text,
    Location,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Text => write!(f, "text"),
            RuleCategory::Location => write!(f, "location"),
        }
    }
}

/// A compiled, case-insensitive pattern and the label reported when it matches.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    label: String,
}

impl Rule {
    pub fn compile(spec: &RuleSpec, category: RuleCategory) -> Result<Self, RuleError> {
        if spec.label.trim().is_empty() {
            return Err(RuleError::EmptyLabel {
                category,
                pattern: spec.pattern.clone(),
            });
        }

        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                category,
                pattern: spec.pattern.clone(),
                label: spec.label.clone(),
                source,
            })?;

        Ok(Rule {
            regex,
            label: spec.label.clone(),
        })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Text and location rules, each kept in declaration order.
///
/// Order is the tie-breaker: when several patterns match, the first one
/// declared wins. Every pattern is compiled up front so a bad one stops the
/// run before any mention is touched.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    text: Vec<Rule>,
    location: Vec<Rule>,
}

impl RuleSet {
    pub fn from_config(rules: &RulesConfig) -> Result<Self, RuleError> {
        let text = compile_all(&rules.text, RuleCategory::Text)?;
        let location = compile_all(&rules.location, RuleCategory::Location)?;

        log::debug!(
            "Compiled {} text rules and {} location rules",
            text.len(),
            location.len()
        );

        Ok(RuleSet { text, location })
    }

    pub fn text_rules(&self) -> &[Rule] {
        &self.text
    }

    pub fn location_rules(&self) -> &[Rule] {
        &self.location
    }

    pub fn len(&self) -> usize {
        self.text.len() + self.location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.location.is_empty()
    }
}

fn compile_all(specs: &[RuleSpec], category: RuleCategory) -> Result<Vec<Rule>, RuleError> {
    specs
        .iter()
        .map(|spec| Rule::compile(spec, category))
        .collect()
}
