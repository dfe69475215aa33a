//! Free text + field restriction queries
//!
//! Restrictions are validated against the index schema before anything is
//! sent to the engine:
//! - values of one field are OR-ed, fields are AND-ed
//! - a field that is not in the schema is an `InvalidRestriction` error
//! - a field mapped to an empty set adds no constraint
//! - numeric fields accept a number or a `YYYY-MM-DD` date
//! - text values are lower-cased to match the keyword-analyzed index; empty
//!   values are dropped, and a field left without values matches nothing

use std::collections::{BTreeMap, BTreeSet};

use crate::db::design::{date_key, FieldKind, IndexDefinition};
use crate::{Error, Result};

const MATCH_NOTHING: &str = "(*:* -*:*)";

/// Field name → allowed literal values.
pub type SubQueryRestrictions = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, PartialEq)]
pub enum RestrictionValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRestriction {
    pub field: String,
    pub values: Vec<RestrictionValue>,
}

/// A validated query, ready for any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Free text, trimmed. Empty means match-all.
    pub text: String,
    pub restrictions: Vec<FieldRestriction>,
}

impl SearchQuery {
    pub fn build(
        text: &str,
        restrictions: &SubQueryRestrictions,
        index: &IndexDefinition,
    ) -> Result<Self> {
        let mut resolved = Vec::with_capacity(restrictions.len());

        for (field, values) in restrictions {
            let Some(spec) = index.field(field) else {
                return Err(Error::InvalidRestriction {
                    field: field.clone(),
                    reason: format!("not a field of the '{}' index", index.name()),
                });
            };
            if !spec.stored {
                return Err(Error::InvalidRestriction {
                    field: field.clone(),
                    reason: "field is indexed but not stored".to_string(),
                });
            }
            if values.is_empty() {
                continue;
            }

            // Empty values are never indexed; a field left with no values
            // matches nothing.
            let present = values.iter().filter(|v| !v.trim().is_empty());
            let values = match spec.kind {
                FieldKind::Text => present
                    .map(|v| RestrictionValue::Text(v.to_lowercase()))
                    .collect(),
                FieldKind::Double => present
                    .map(|v| parse_number(field, v))
                    .collect::<Result<Vec<_>>>()?,
            };

            resolved.push(FieldRestriction {
                field: field.clone(),
                values,
            });
        }

        Ok(Self {
            text: text.trim().to_string(),
            restrictions: resolved,
        })
    }

    pub fn is_match_all(&self) -> bool {
        self.text.is_empty() && self.restrictions.is_empty()
    }

    /// True when some restricted field kept no usable value.
    pub fn matches_nothing(&self) -> bool {
        self.restrictions.iter().any(|r| r.values.is_empty())
    }

    /// Lucene query string for the engine.
    pub fn to_lucene(&self) -> String {
        let mut clauses = Vec::with_capacity(self.restrictions.len() + 1);

        if !self.text.is_empty() {
            clauses.push(format!("({})", self.text));
        }

        for restriction in &self.restrictions {
            if restriction.values.is_empty() {
                clauses.push(MATCH_NOTHING.to_string());
                continue;
            }
            let alternatives: Vec<String> = restriction
                .values
                .iter()
                .map(|value| match value {
                    RestrictionValue::Text(s) => {
                        format!("{}:\"{}\"", restriction.field, escape_phrase(s))
                    }
                    RestrictionValue::Number(n) => {
                        let n = format_number(*n);
                        format!("{}:[{} TO {}]", restriction.field, n, n)
                    }
                })
                .collect();
            clauses.push(format!("({})", alternatives.join(" OR ")));
        }

        if clauses.is_empty() {
            "*:*".to_string()
        } else {
            clauses.join(" AND ")
        }
    }
}

fn parse_number(field: &str, raw: &str) -> Result<RestrictionValue> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<f64>() {
        if n.is_finite() {
            return Ok(RestrictionValue::Number(n));
        }
    }
    if let Some(key) = date_key(raw) {
        return Ok(RestrictionValue::Number(f64::from(key)));
    }
    Err(Error::InvalidRestriction {
        field: field.to_string(),
        reason: format!("'{}' is neither a number nor a YYYY-MM-DD date", raw),
    })
}

fn escape_phrase(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Reject query text a Lucene parser cannot accept: unbalanced quotes or
/// parentheses, or a dangling escape.
pub fn check_syntax(text: &str) -> Result<()> {
    let mut depth: i32 = 0;
    let mut in_phrase = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().is_none() {
                    return Err(Error::InvalidQuery(
                        "query ends with a dangling escape".to_string(),
                    ));
                }
            }
            '"' => in_phrase = !in_phrase,
            '(' if !in_phrase => depth += 1,
            ')' if !in_phrase => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::InvalidQuery(
                        "unbalanced ')' in query".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }

    if in_phrase {
        return Err(Error::InvalidQuery("unterminated phrase in query".to_string()));
    }
    if depth != 0 {
        return Err(Error::InvalidQuery("unbalanced '(' in query".to_string()));
    }
    Ok(())
}
