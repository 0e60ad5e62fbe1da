//! Feature predicate language.
//!
//! A predicate is one or more terms joined by `AND`:
//!
//! - `type:<kind>` — feature kind (`building`, `parcel`, `boundary`, `road`, `other`)
//! - `<tag>` — tag is present
//! - `<tag>=<value>` — exact value
//! - `<tag>~<pattern>` — case-insensitive regex matching the whole value
//! - `<tag>:<text>` — case-insensitive substring
//!
//! Keys and values may be double-quoted (`"addr:street"="West Oak Street"`);
//! inside quotes `\"` and `\\` escape a quote and a backslash.

use std::fmt;
use std::str::FromStr;

use building_address_models::{Feature, FeatureKind};
use regex::{Regex, RegexBuilder};

use crate::QueryError;

/// Parsed predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `type:<kind>`
    Type(FeatureKind),
    /// `<tag>`
    Has(String),
    /// `<tag>=<value>`
    Equals {
        /// Tag key.
        key: String,
        /// Exact value.
        value: String,
    },
    /// `<tag>~<pattern>`
    Matches {
        /// Tag key.
        key: String,
        /// Regex matched against the whole value, ignoring case.
        pattern: String,
    },
    /// `<tag>:<text>`
    Contains {
        /// Tag key.
        key: String,
        /// Substring, compared ignoring case.
        text: String,
    },
    /// Terms joined by `AND`.
    And(Vec<Self>),
}

impl Predicate {
    /// Parses the textual form.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on empty input, malformed terms, or an
    /// unknown `type:` kind. Regex patterns are not validated until the
    /// predicate is compiled.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        Parser::new(input).parse()
    }

    /// Conjunction of `terms`, flattening a single term.
    #[must_use]
    pub fn all(mut terms: Vec<Self>) -> Self {
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Self::And(terms)
        }
    }

    /// Compiles regex patterns so the predicate can be evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Pattern`] if a `~` pattern is not a valid regex.
    pub fn compile(&self) -> Result<CompiledPredicate, QueryError> {
        let node = match self {
            Self::Type(kind) => Node::Type(*kind),
            Self::Has(key) => Node::Has(key.clone()),
            Self::Equals { key, value } => Node::Equals {
                key: key.clone(),
                value: value.clone(),
            },
            Self::Matches { key, pattern } => {
                let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| QueryError::Pattern {
                        key: key.clone(),
                        source,
                    })?;
                Node::Matches {
                    key: key.clone(),
                    regex,
                }
            }
            Self::Contains { key, text } => Node::Contains {
                key: key.clone(),
                text: text.to_lowercase(),
            },
            Self::And(terms) => Node::And(
                terms
                    .iter()
                    .map(|t| t.compile().map(|c| c.node))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(CompiledPredicate { node })
    }
}

impl FromStr for Predicate {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(kind) => write!(f, "type:{kind}"),
            Self::Has(key) => write_token(f, key),
            Self::Equals { key, value } => write_term(f, key, '=', value),
            Self::Matches { key, pattern } => write_term(f, key, '~', pattern),
            Self::Contains { key, text } => write_term(f, key, ':', text),
            Self::And(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{term}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, key: &str, op: char, value: &str) -> fmt::Result {
    write_token(f, key)?;
    write!(f, "{op}")?;
    write_token(f, value)
}

fn write_token(f: &mut fmt::Formatter<'_>, token: &str) -> fmt::Result {
    let needs_quotes = token.is_empty()
        || token == "AND"
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\' | '=' | '~' | ':'));
    if !needs_quotes {
        return f.write_str(token);
    }
    f.write_str("\"")?;
    for c in token.chars() {
        if matches!(c, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

/// A predicate ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    node: Node,
}

impl CompiledPredicate {
    /// Returns `true` if `feature` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, feature: &Feature) -> bool {
        self.node.matches(feature)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Type(FeatureKind),
    Has(String),
    Equals { key: String, value: String },
    Matches { key: String, regex: Regex },
    Contains { key: String, text: String },
    And(Vec<Self>),
}

impl Node {
    fn matches(&self, feature: &Feature) -> bool {
        match self {
            Self::Type(kind) => feature.kind == *kind,
            Self::Has(key) => feature.has_tag(key),
            Self::Equals { key, value } => feature.tag(key) == Some(value.as_str()),
            Self::Matches { key, regex } => feature.tag(key).is_some_and(|v| regex.is_match(v)),
            Self::Contains { key, text } => feature
                .tag(key)
                .is_some_and(|v| v.to_lowercase().contains(text.as_str())),
            Self::And(terms) => terms.iter().all(|t| t.matches(feature)),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<Predicate, QueryError> {
        let mut terms = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_eof() {
                if terms.is_empty() {
                    return Err(QueryError::Empty);
                }
                return Err(self.error("expected a term after AND"));
            }

            terms.push(self.term()?);

            self.skip_whitespace();
            if self.is_eof() {
                break;
            }
            self.keyword_and()?;
        }

        Ok(Predicate::all(terms))
    }

    fn term(&mut self) -> Result<Predicate, QueryError> {
        let start = self.pos;
        let key = self.token(true)?;
        if key.is_empty() {
            return Err(self.error("expected a tag key"));
        }

        let Some(op) = self.peek().filter(|&c| matches!(c, '=' | '~' | ':')) else {
            return Ok(Predicate::Has(key));
        };
        self.pos += op.len_utf8();

        let value = self.token(false)?;

        Ok(match op {
            ':' if key == "type" => {
                let kind = FeatureKind::from_str(&value)
                    .map_err(|_| QueryError::UnknownType(value.clone()))?;
                Predicate::Type(kind)
            }
            ':' => Predicate::Contains { key, text: value },
            '=' => Predicate::Equals { key, value },
            _ => {
                if value.is_empty() {
                    self.pos = start;
                    return Err(self.error("empty pattern"));
                }
                Predicate::Matches {
                    key,
                    pattern: value,
                }
            }
        })
    }

    /// Reads a bare or quoted token. Bare keys also stop at an operator.
    fn token(&mut self, is_key: bool) -> Result<String, QueryError> {
        if self.peek() == Some('"') {
            return self.quoted();
        }

        let rest = &self.input[self.pos..];
        let end = rest
            .find(|c: char| c.is_whitespace() || (is_key && matches!(c, '=' | '~' | ':')))
            .unwrap_or(rest.len());
        let token = rest[..end].to_string();
        self.pos += end;
        Ok(token)
    }

    fn quoted(&mut self) -> Result<String, QueryError> {
        let input = self.input;
        let open = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut escaped = false;

        for (offset, c) in input[self.pos..].char_indices() {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                self.pos += offset + 1;
                return Ok(out);
            } else {
                out.push(c);
            }
        }

        self.pos = open;
        Err(self.error("unterminated quote"))
    }

    fn keyword_and(&mut self) -> Result<(), QueryError> {
        let rest = &self.input[self.pos..];
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if rest[..word_end].eq_ignore_ascii_case("AND") {
            self.pos += word_end;
            Ok(())
        } else {
            Err(self.error("expected AND"))
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: &str) -> QueryError {
        QueryError::Syntax {
            offset: self.pos,
            message: message.to_string(),
        }
    }
}
