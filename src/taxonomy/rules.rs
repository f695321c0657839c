//! Ordered keyword-containment rules compiled into Aho-Corasick automata.
use std::collections::BTreeSet;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// One row of a rule table: the label wins when any `any_of` keyword is
/// contained in the uppercased text and no `none_of` keyword is.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub label: &'static str,
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
}

impl RuleSpec {
    pub(crate) const fn any(label: &'static str, any_of: &'static [&'static str]) -> Self {
        Self {
            label,
            any_of,
            none_of: &[],
        }
    }

    pub(crate) const fn any_except(
        label: &'static str,
        any_of: &'static [&'static str],
        none_of: &'static [&'static str],
    ) -> Self {
        Self {
            label,
            any_of,
            none_of,
        }
    }
}

/// Static description of a taxonomy: its placeholder label, its catch-all
/// label and the ordered rules in between.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub unspecified: &'static str,
    pub fallback: &'static str,
    pub rules: &'static [RuleSpec],
}

#[derive(Debug)]
struct CompiledRule {
    label: &'static str,
    any_of: AhoCorasick,
    none_of: Option<AhoCorasick>,
}

impl CompiledRule {
    fn matches(&self, upper: &str) -> bool {
        self.any_of.is_match(upper)
            && !self
                .none_of
                .as_ref()
                .is_some_and(|excluded| excluded.is_match(upper))
    }
}

/// A rule table ready for classification.
#[derive(Debug)]
pub struct RuleTable {
    spec: TableSpec,
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compiles every rule of `spec`, preserving rule order.
    ///
    /// # Errors
    /// Returns an error if an automaton cannot be built from the keywords.
    pub fn compile(spec: TableSpec) -> Result<Self, aho_corasick::BuildError> {
        let rules = spec
            .rules
            .iter()
            .map(|rule| {
                let none_of = if rule.none_of.is_empty() {
                    None
                } else {
                    Some(automaton(rule.none_of)?)
                };
                Ok(CompiledRule {
                    label: rule.label,
                    any_of: automaton(rule.any_of)?,
                    none_of,
                })
            })
            .collect::<Result<Vec<_>, aho_corasick::BuildError>>()?;
        Ok(Self { spec, rules })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    #[must_use]
    pub fn unspecified(&self) -> &'static str {
        self.spec.unspecified
    }

    #[must_use]
    pub fn fallback(&self) -> &'static str {
        self.spec.fallback
    }

    /// Closed label set of the taxonomy.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<&'static str> {
        let mut labels: BTreeSet<&'static str> =
            self.rules.iter().map(|rule| rule.label).collect();
        labels.insert(self.spec.unspecified);
        labels.insert(self.spec.fallback);
        labels
    }

    /// Resolves a raw field to exactly one label. Null, blank and `-`
    /// resolve to the unspecified label before any keyword is tested.
    #[must_use]
    pub fn classify(&self, raw: Option<&str>) -> &'static str {
        let Some(text) = raw else {
            return self.spec.unspecified;
        };
        if is_placeholder(text) {
            return self.spec.unspecified;
        }
        let upper = text.to_uppercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&upper))
            .map_or(self.spec.fallback, |rule| rule.label)
    }
}

/// Blank or `-` after trimming.
#[must_use]
pub fn is_placeholder(text: &str) -> bool {
    matches!(text.trim(), "" | "-")
}

fn automaton(keywords: &[&str]) -> Result<AhoCorasick, aho_corasick::BuildError> {
    AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostFirst)
        .build(keywords)
}
