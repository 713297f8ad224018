//! Route pattern module
//!
//! Parses path templates such as `/book/{title}/page/{page:d}` and matches
//! request paths against them.
//!
//! Matching rules:
//! - the whole path must be consumed, trailing text fails the match
//! - literals compare case-insensitively
//! - `{name:d}` takes the maximal run of decimal digits and yields an `i64`
//! - `{name}` takes the shortest non-empty run that lets the rest match

use crate::error::RouteError;
use regex::Regex;
use std::fmt;

/// How a captured placeholder value is coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Str,
    Int,
}

/// A single extracted path parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

/// Named parameters extracted from a matched path, in pattern order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// String value of a `{name}` placeholder
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Str(s) => Some(s),
            ParamValue::Int(_) => None,
        }
    }

    /// Integer value of a `{name:d}` placeholder
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(n) => Some(*n),
            ParamValue::Str(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A parsed route pattern; identity is the source string
///
/// The template is compiled once into an anchored [`Regex`] with one capture
/// group per placeholder, in pattern order.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    placeholders: Vec<(String, Coercion)>,
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RoutePattern {}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl RoutePattern {
    pub fn parse(source: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        // `s` lets a string placeholder span any character, newlines included
        let mut pattern = String::with_capacity(source.len() + 8);
        pattern.push_str("(?si)^");
        let mut placeholders: Vec<(String, Coercion)> = Vec::new();
        let mut rest = source;

        while !rest.is_empty() {
            let next = rest.find(['{', '}']).unwrap_or(rest.len());
            pattern.push_str(&regex::escape(&rest[..next]));
            rest = &rest[next..];

            if rest.starts_with('}') {
                return Err(invalid("unmatched `}`"));
            }
            if rest.is_empty() {
                break;
            }

            let close = rest.find('}').ok_or_else(|| invalid("unclosed `{`"))?;
            let inner = &rest[1..close];
            if inner.contains('{') {
                return Err(invalid("nested `{`"));
            }
            let (name, kind) = inner.split_once(':').unwrap_or((inner, ""));
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(invalid(&format!("bad placeholder name `{name}`")));
            }
            if placeholders.iter().any(|(seen, _)| seen == name) {
                return Err(invalid(&format!("placeholder `{name}` used twice")));
            }
            let coercion = match kind {
                "" => Coercion::Str,
                "d" => Coercion::Int,
                other => return Err(invalid(&format!("unknown coercion `{other}`"))),
            };
            pattern.push_str(match coercion {
                Coercion::Str => "(.+?)",
                Coercion::Int => "([0-9]+)",
            });
            placeholders.push((name.to_string(), coercion));
            rest = &rest[close + 1..];
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            regex,
            placeholders,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match the whole `path`, returning the extracted parameters on success
    pub fn matches(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut values = Vec::with_capacity(self.placeholders.len());

        for (index, (name, coercion)) in self.placeholders.iter().enumerate() {
            let capture = captures.get(index + 1)?;
            let value = match coercion {
                Coercion::Str => ParamValue::Str(capture.as_str().to_string()),
                Coercion::Int => {
                    // Digits must be maximal even when a digit literal follows
                    if path[capture.end()..].starts_with(|c: char| c.is_ascii_digit()) {
                        return None;
                    }
                    // Overflow is a mismatch, not an error
                    ParamValue::Int(capture.as_str().parse().ok()?)
                }
            };
            values.push((name.clone(), value));
        }
        Some(Params { values })
    }
}
