//! Parcel street components and their expansion.
//!
//! County parcel data records a street as separate abbreviated tokens
//! (`PREFIX=W`, `STREETNAME=OAK`, `STREETTYPE=ST`) while mapped roads
//! carry full names (`West Oak Street`). This module holds the raw
//! components, the cache key derived from them, and the expansion through
//! the configured lookup tables.

use std::fmt;
use std::sync::LazyLock;

use building_address_models::{ParcelView, StreetTables};
use regex::Regex;

/// Regex matching any whitespace run.
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Raw street components of a parcel address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetAddress {
    /// Directional prefix code, e.g. `W`.
    pub prefix: Option<String>,
    /// Street name, e.g. `OAK` or `PORT WASHINGTON`.
    pub name: String,
    /// Street type abbreviation, e.g. `ST`.
    pub street_type: Option<String>,
    /// Trailing suffix, e.g. a post-directional.
    pub suffix: Option<String>,
}

impl StreetAddress {
    /// Creates an address from raw tokens. Blank tokens become `None`.
    #[must_use]
    pub fn new(
        prefix: Option<&str>,
        name: &str,
        street_type: Option<&str>,
        suffix: Option<&str>,
    ) -> Self {
        let token = |t: Option<&str>| {
            t.map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
        };
        Self {
            prefix: token(prefix),
            name: name.trim().to_string(),
            street_type: token(street_type),
            suffix: token(suffix),
        }
    }

    /// Reads the street components of a parcel.
    ///
    /// Returns `None` if the parcel has no street name.
    #[must_use]
    pub fn from_parcel(parcel: &ParcelView<'_>) -> Option<Self> {
        let name = parcel.street_name()?;
        Some(Self::new(
            parcel.prefix(),
            name,
            parcel.street_type(),
            parcel.suffix(),
        ))
    }

    /// Cache key: the raw prefix, name and type tokens, compared exactly.
    #[must_use]
    pub fn key(&self) -> StreetKey {
        StreetKey {
            prefix: self.prefix.clone().unwrap_or_default(),
            name: self.name.clone(),
            street_type: self.street_type.clone().unwrap_or_default(),
        }
    }

    /// Expands abbreviations through `tables`.
    #[must_use]
    pub fn expand(&self, tables: &StreetTables) -> ExpandedStreet {
        let prefix = self
            .prefix
            .as_deref()
            .and_then(|p| tables.direction(p))
            .map(ToString::to_string);

        let street_type = self
            .street_type
            .as_deref()
            .map(|t| tables.street_type(t).unwrap_or(t).to_string());

        let suffix = self
            .suffix
            .as_deref()
            .map(|s| tables.direction(s).unwrap_or(s).to_string());

        let name = collapse_whitespace(&self.name);

        ExpandedStreet {
            prefix,
            joined_name: remove_whitespace(&name),
            name,
            street_type,
            suffix,
        }
    }
}

impl fmt::Display for StreetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            self.prefix.as_deref(),
            Some(self.name.as_str()),
            self.street_type.as_deref(),
            self.suffix.as_deref(),
        ];
        f.write_str(&join_words(&parts))
    }
}

/// Key under which a resolved road name is cached for one run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreetKey {
    /// Raw prefix token (empty when absent).
    pub prefix: String,
    /// Raw street name.
    pub name: String,
    /// Raw street type token (empty when absent).
    pub street_type: String,
}

impl StreetKey {
    /// Builds a key from raw tokens.
    #[must_use]
    pub fn new(prefix: &str, name: &str, street_type: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            name: name.to_string(),
            street_type: street_type.to_string(),
        }
    }
}

/// Street components with abbreviations expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedStreet {
    /// Full directional word, when the prefix code is known.
    pub prefix: Option<String>,
    /// Street name with whitespace runs collapsed.
    pub name: String,
    /// Street name with all whitespace removed (`PORT WASHINGTON` ->
    /// `PORTWASHINGTON`).
    pub joined_name: String,
    /// Full street type, or the raw token when unknown.
    pub street_type: Option<String>,
    /// Expanded suffix, or the raw token when unknown.
    pub suffix: Option<String>,
}

/// Joins the present, non-empty parts with single spaces.
#[must_use]
pub fn join_words(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trims and collapses whitespace runs to single spaces.
#[must_use]
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE_RE.replace_all(input.trim(), " ").into_owned()
}

/// Removes all whitespace.
#[must_use]
pub fn remove_whitespace(input: &str) -> String {
    WHITESPACE_RE.replace_all(input, "").into_owned()
}
