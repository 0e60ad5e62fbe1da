//! Road-name query patterns, most specific first.
//!
//! 1. `<Prefix> <Name> <Type>`, exact
//! 2. `<Prefix> <NameWithoutSpaces> <Type>`, exact
//! 3. `<Name> <Type>`, exact
//! 4. `<NameWithoutSpaces> <Type>`, exact
//! 5. `<Name> <Type> <Suffix>`, substring
//! 6. `<Prefix> <Name> <RAWTYPE>`, exact
//! 7. `<Name> <RAWTYPE>`, exact
//!
//! Steps 6 and 7 keep the parcel's own type token for roads mapped with
//! abbreviated types (`West Oak St`). Exact patterns ignore case and
//! tolerate any whitespace run between words. Steps whose text is empty
//! or repeats an earlier step are dropped; steps 1, 2 and 6 need a known
//! directional prefix.

use std::fmt;

use building_address_models::{FeatureKind, StreetTables};
use building_address_store::Predicate;

use crate::normalize::{StreetAddress, join_words};

/// How a pattern is compared with road names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole name, case-insensitive.
    Exact,
    /// Substring, case-insensitive.
    Partial,
}

/// One step of the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    /// Position in the full cascade (1-based), kept even when earlier
    /// steps were dropped.
    pub step: usize,
    /// Comparison mode.
    pub mode: MatchMode,
    /// Expected road name (or fragment).
    pub text: String,
}

impl NamePattern {
    /// Road-index predicate for this step: highway features whose `name`
    /// matches the pattern.
    #[must_use]
    pub fn predicate(&self) -> Predicate {
        let name = match self.mode {
            MatchMode::Exact => Predicate::Matches {
                key: "name".to_string(),
                pattern: exact_pattern(&self.text),
            },
            MatchMode::Partial => Predicate::Contains {
                key: "name".to_string(),
                text: self.text.clone(),
            },
        };

        Predicate::And(vec![
            Predicate::Type(FeatureKind::RoadSegment),
            Predicate::Has("highway".to_string()),
            name,
        ])
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            MatchMode::Exact => "exact",
            MatchMode::Partial => "partial",
        };
        write!(f, "step {} ({mode}) \"{}\"", self.step, self.text)
    }
}

/// Builds the cascade for `address`.
#[must_use]
pub fn build_patterns(address: &StreetAddress, tables: &StreetTables) -> Vec<NamePattern> {
    let e = address.expand(tables);
    let prefix = e.prefix.as_deref();
    let street_type = e.street_type.as_deref();
    let name = Some(e.name.as_str());
    let joined = Some(e.joined_name.as_str());
    let raw_type = address.street_type.as_deref();

    let candidates = [
        (MatchMode::Exact, prefix.map(|p| join_words(&[Some(p), name, street_type]))),
        (MatchMode::Exact, prefix.map(|p| join_words(&[Some(p), joined, street_type]))),
        (MatchMode::Exact, Some(join_words(&[name, street_type]))),
        (MatchMode::Exact, Some(join_words(&[joined, street_type]))),
        (
            MatchMode::Partial,
            Some(join_words(&[name, street_type, e.suffix.as_deref()])),
        ),
        (MatchMode::Exact, prefix.map(|p| join_words(&[Some(p), name, raw_type]))),
        (MatchMode::Exact, Some(join_words(&[name, raw_type]))),
    ];

    let mut patterns: Vec<NamePattern> = Vec::with_capacity(candidates.len());

    for (i, (mode, text)) in candidates.into_iter().enumerate() {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            continue;
        };
        if patterns.iter().any(|p| p.mode == mode && p.text == text) {
            continue;
        }
        patterns.push(NamePattern {
            step: i + 1,
            mode,
            text,
        });
    }

    patterns
}

/// Regex for a whole-name match: each word escaped, any whitespace run
/// between words.
fn exact_pattern(text: &str) -> String {
    text.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
