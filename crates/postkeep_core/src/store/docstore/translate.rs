//! Positional placeholder substitution for document-store query templates.
//!
//! The document query dialect has no parameter binding, so `?` placeholders
//! are replaced textually. `translate` performs no escaping of its own;
//! user-originated strings must pass through `escape_literal` first.

use crate::store::QueryArg;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PLACEHOLDER: char = '?';

/// Document query construction or parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Template placeholder count differs from the supplied argument count.
    PlaceholderMismatch { placeholders: usize, supplied: usize },
    /// Translated query is not valid in the document query dialect.
    Syntax { query: String, message: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PlaceholderMismatch {
                placeholders,
                supplied,
            } => write!(
                f,
                "query template has {placeholders} placeholders but {supplied} arguments were supplied"
            ),
            Self::Syntax { query, message } => {
                write!(f, "invalid document query `{query}`: {message}")
            }
        }
    }
}

impl Error for QueryError {}

/// Replaces each `?` in `template`, left to right, with the string form of
/// the matching argument.
///
/// # Errors
/// - `PlaceholderMismatch` when the counts differ; nothing is substituted.
pub fn translate(template: &str, args: &[QueryArg]) -> Result<String, QueryError> {
    let placeholders = template.matches(PLACEHOLDER).count();
    if placeholders != args.len() {
        return Err(QueryError::PlaceholderMismatch {
            placeholders,
            supplied: args.len(),
        });
    }

    let mut args = args.iter();
    let mut translated = String::with_capacity(template.len());
    for ch in template.chars() {
        if ch != PLACEHOLDER {
            translated.push(ch);
        } else if let Some(arg) = args.next() {
            translated.push_str(&arg.to_string());
        }
    }
    Ok(translated)
}

/// Escapes text for use inside a single-quoted dialect literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}
