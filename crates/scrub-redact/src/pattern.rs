//! Hybrid literal / glob / regex pattern matching.
//!
//! Pattern forms are classified once, at parse time:
//! - `/.../` is a regular expression
//! - anything containing `*` is a glob, anchored at both ends
//! - everything else is a literal, matched by containment unless
//!   `full_match` asks for equality

use crate::error::{RedactionError, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// How a pattern source was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Literal,
    Glob,
    Regex,
}

/// Strip the `/.../` delimiters of a regex-form pattern.
pub fn regex_body(source: &str) -> Option<&str> {
    if source.len() >= 2 && source.starts_with('/') && source.ends_with('/') {
        Some(&source[1..source.len() - 1])
    } else {
        None
    }
}

/// Compile `expr` with the requested case sensitivity.
pub(crate) fn build_regex(source: &str, expr: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(expr)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| RedactionError::pattern(source, e.to_string()))
}

fn glob_to_regex(glob: &str) -> String {
    let parts: Vec<String> = glob.split('*').map(regex::escape).collect();
    format!(r"(?s)\A{}\z", parts.join(".*"))
}

#[derive(Debug, Clone)]
struct Compiled {
    cased: Regex,
    folded: Regex,
    whole_cased: Regex,
    whole_folded: Regex,
}

impl Compiled {
    fn new(source: &str, partial: &str, whole: &str) -> Result<Self> {
        Ok(Self {
            cased: build_regex(source, partial, true)?,
            folded: build_regex(source, partial, false)?,
            whole_cased: build_regex(source, whole, true)?,
            whole_folded: build_regex(source, whole, false)?,
        })
    }

    fn partial(&self, case_sensitive: bool) -> &Regex {
        if case_sensitive {
            &self.cased
        } else {
            &self.folded
        }
    }

    fn whole(&self, case_sensitive: bool) -> &Regex {
        if case_sensitive {
            &self.whole_cased
        } else {
            &self.whole_folded
        }
    }
}

/// A single classified pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    kind: PatternKind,
    folded_literal: String,
    compiled: Option<Compiled>,
}

impl Pattern {
    /// Classify and compile a pattern source.
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(RedactionError::pattern(source, "empty pattern"));
        }

        let (kind, compiled) = if let Some(body) = regex_body(source) {
            let whole = format!(r"\A(?:{})\z", body);
            (PatternKind::Regex, Some(Compiled::new(source, body, &whole)?))
        } else if source.contains('*') {
            let expr = glob_to_regex(source);
            (PatternKind::Glob, Some(Compiled::new(source, &expr, &expr)?))
        } else {
            (PatternKind::Literal, None)
        };

        Ok(Self {
            source: source.to_string(),
            kind,
            folded_literal: source.to_lowercase(),
            compiled,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Test a candidate.
    ///
    /// Regexes match anywhere in the candidate, globs match the whole
    /// candidate. `full_match` only changes literal patterns.
    pub fn matches(&self, candidate: &str, case_sensitive: bool, full_match: bool) -> bool {
        if candidate.is_empty() {
            return false;
        }
        match &self.compiled {
            Some(compiled) => compiled.partial(case_sensitive).is_match(candidate),
            None if case_sensitive => {
                if full_match {
                    candidate == self.source
                } else {
                    candidate.contains(&self.source)
                }
            }
            None => {
                let folded = candidate.to_lowercase();
                if full_match {
                    folded == self.folded_literal
                } else {
                    folded.contains(&self.folded_literal)
                }
            }
        }
    }

    /// Test whether the pattern covers the entire candidate, for every form.
    pub fn matches_whole(&self, candidate: &str, case_sensitive: bool) -> bool {
        if candidate.is_empty() {
            return false;
        }
        match &self.compiled {
            Some(compiled) => compiled.whole(case_sensitive).is_match(candidate),
            None => self.matches(candidate, case_sensitive, true),
        }
    }
}

/// An ordered list of patterns sharing one case/full-match setting.
///
/// An empty set never matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    case_sensitive: bool,
    full_match: bool,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(
        sources: &[S],
        case_sensitive: bool,
        full_match: bool,
    ) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|s| Pattern::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            case_sensitive,
            full_match,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.first_match(candidate).is_some()
    }

    pub fn first_match(&self, candidate: &str) -> Option<&Pattern> {
        self.patterns
            .iter()
            .find(|p| p.matches(candidate, self.case_sensitive, self.full_match))
    }
}

/// Exceptions that suppress a match.
///
/// Checked in order: exact literals, ignore patterns, then `ignore_after`
/// context regexes that must end right where the candidate starts.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    exact: HashSet<String>,
    case_sensitive: bool,
    patterns: PatternSet,
    after: Vec<Regex>,
}

impl IgnoreRules {
    pub fn compile<S: AsRef<str>>(
        exact: &[S],
        ignore: &[S],
        ignore_after: &[S],
        case_sensitive: bool,
    ) -> Result<Self> {
        let exact = exact
            .iter()
            .map(|s| fold(s.as_ref(), case_sensitive))
            .collect();
        let patterns = PatternSet::compile(ignore, case_sensitive, false)?;
        let after = ignore_after
            .iter()
            .map(|ctx| {
                let ctx = ctx.as_ref();
                let body = regex_body(ctx).unwrap_or(ctx);
                build_regex(ctx, &format!(r"(?:{})\z", body), case_sensitive)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            exact,
            case_sensitive,
            patterns,
            after,
        })
    }

    /// Whether `candidate` is exempt. `preceding` is the text before it.
    pub fn is_ignored(&self, candidate: &str, preceding: &str) -> bool {
        self.is_exact(candidate)
            || self.patterns.matches(candidate)
            || self.after.iter().any(|re| re.is_match(preceding))
    }

    /// Whether `candidate` is one of the exact-literal exceptions.
    pub fn is_exact(&self, candidate: &str) -> bool {
        !self.exact.is_empty() && self.exact.contains(&fold(candidate, self.case_sensitive))
    }
}

pub(crate) fn fold(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}
