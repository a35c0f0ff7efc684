//! Token rules: `- pattern`, `+ pattern`, `! pattern replacement`.
//!
//! Rules are matched against whole tokens, case-sensitively. For each token
//! the keep rules are consulted first; otherwise the first matching redact or
//! replace rule applies.

use crate::error::{RedactionError, Result};
use crate::pattern::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;

/// Word characters, `-`, `@` and `/`, with dots allowed between them.
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w@/-]+(?:\.[\w@/-]+)*").unwrap());

/// Byte spans of the tokens in `text`.
pub fn token_spans(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    TOKEN.find_iter(text).map(|m| (m.start(), m.end()))
}

/// What a matching rule does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    Keep,
    Redact,
    Replace(String),
}

#[derive(Debug, Clone)]
pub struct TextRule {
    pattern: Pattern,
    action: RuleAction,
}

impl TextRule {
    pub fn parse(rule: &str) -> Result<Self> {
        let invalid = |message: &str| RedactionError::RuleError {
            rule: rule.to_string(),
            message: message.to_string(),
        };

        let trimmed = rule.trim();
        let mut chars = trimmed.chars();
        let op = chars.next().ok_or_else(|| invalid("empty rule"))?;
        let rest = chars.as_str().trim();
        if rest.is_empty() {
            return Err(invalid("missing pattern"));
        }

        let (pattern, action) = match op {
            '-' => (rest, RuleAction::Redact),
            '+' => (rest, RuleAction::Keep),
            '!' => {
                let (pattern, replacement) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| invalid("missing replacement"))?;
                (pattern, RuleAction::Replace(replacement.trim().to_string()))
            }
            _ => return Err(invalid("rule must start with '-', '+' or '!'")),
        };

        Ok(Self {
            pattern: Pattern::parse(pattern)?,
            action,
        })
    }

    pub fn action(&self) -> &RuleAction {
        &self.action
    }

    pub fn matches(&self, token: &str) -> bool {
        self.pattern.matches_whole(token, true)
    }
}

/// Parsed rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    keep: Vec<TextRule>,
    apply: Vec<TextRule>,
}

impl RuleSet {
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self> {
        let mut set = RuleSet::default();
        for rule in rules {
            let parsed = TextRule::parse(rule.as_ref())?;
            if parsed.action == RuleAction::Keep {
                set.keep.push(parsed);
            } else {
                set.apply.push(parsed);
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.keep.is_empty() && self.apply.is_empty()
    }

    /// Decide what happens to one token, if any rule applies.
    pub fn decide(&self, token: &str) -> Option<&RuleAction> {
        if let Some(rule) = self.keep.iter().find(|r| r.matches(token)) {
            return Some(&rule.action);
        }
        self.apply
            .iter()
            .find(|r| r.matches(token))
            .map(|r| &r.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<&str> {
        token_spans(text).map(|(s, e)| &text[s..e]).collect()
    }

    #[test]
    fn tokenizer_keeps_inner_dots_and_dashes() {
        assert_eq!(
            tokens("Servers: prod-server-01, host.example.com. /tmp/x a@b.io"),
            vec!["Servers", "prod-server-01", "host.example.com", "/tmp/x", "a@b.io"]
        );
    }

    #[test]
    fn parse_forms() {
        assert_eq!(TextRule::parse("- secret*").unwrap().action(), &RuleAction::Redact);
        assert_eq!(TextRule::parse("+admin*").unwrap().action(), &RuleAction::Keep);
        assert_eq!(
            TextRule::parse("! prod-* PROD SERVER").unwrap().action(),
            &RuleAction::Replace("PROD SERVER".to_string())
        );
        assert!(TextRule::parse("! prod-*").is_err());
        assert!(TextRule::parse("secret").is_err());
        assert!(TextRule::parse("-").is_err());
    }

    #[test]
    fn keep_rules_win() {
        let set = RuleSet::parse(&["- admin*", "+ adminUser"]).unwrap();
        assert_eq!(set.decide("adminUser"), Some(&RuleAction::Keep));
        assert_eq!(set.decide("admin"), Some(&RuleAction::Redact));
        assert_eq!(set.decide("Admin"), None);
    }

    #[test]
    fn first_apply_rule_wins() {
        let set = RuleSet::parse(&["! db-* DATABASE", "- db-*"]).unwrap();
        assert_eq!(
            set.decide("db-01"),
            Some(&RuleAction::Replace("DATABASE".to_string()))
        );
    }
}
