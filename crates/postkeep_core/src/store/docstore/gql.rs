//! Parser and evaluator for the document store's query dialect.
//!
//! Supported shape:
//!
//! ```text
//! SELECT * FROM <Kind>
//!   [WHERE <field> = <literal> (AND <field> = <literal>)*]
//!   [ORDER BY <field> [ASC|DESC] (, <field> [ASC|DESC])*]
//!   [LIMIT <n>] [OFFSET <n>]
//! ```
//!
//! # Invariants
//! - Keywords are case-insensitive; kinds and field names are not.
//! - `__key__` addresses the document key.
//! - An equality filter on a list property matches when any element is equal.
//! - Missing properties sort before present ones.

use crate::store::docstore::documents::Document;
use crate::store::docstore::translate::QueryError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\s*(?:'((?:[^']|'')*)'|(-?\d+)|([A-Za-z_][A-Za-z0-9_]*)|([*,=]))")
        .expect("valid query token regex")
});
static TRAILING_WS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*\z").expect("valid trailing whitespace regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Int(i64),
    Word(String),
    Symbol(char),
}

/// Equality filter on one property.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// One `ORDER BY` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// Parsed document query.
#[derive(Debug, Clone, PartialEq)]
pub struct GqlQuery {
    pub kind: String,
    pub filters: Vec<Filter>,
    pub order: Vec<SortKey>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl GqlQuery {
    /// Whether `document` satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| {
            match document.property(&filter.field) {
                Some(Value::Array(items)) => items.iter().any(|item| item == &filter.value),
                Some(value) => value == filter.value,
                None => false,
            }
        })
    }

    /// Orders two documents by the query's sort keys.
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        for key in &self.order {
            let ordering = compare_values(
                left.property(&key.field).as_ref(),
                right.property(&key.field).as_ref(),
            );
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Parses one query string.
pub fn parse(query: &str) -> Result<GqlQuery, QueryError> {
    let tokens = tokenize(query)?;
    Parser {
        query,
        tokens,
        position: 0,
    }
    .parse_query()
}

fn tokenize(query: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    let mut rest = query;
    while !TRAILING_WS_RE.is_match(rest) {
        let caps = TOKEN_RE
            .captures(rest)
            .ok_or_else(|| syntax(query, format!("unexpected input near `{}`", rest.trim_start())))?;
        let token = if let Some(text) = caps.get(1) {
            Token::Text(text.as_str().replace("''", "'"))
        } else if let Some(number) = caps.get(2) {
            let value = number
                .as_str()
                .parse::<i64>()
                .map_err(|err| syntax(query, format!("invalid integer literal: {err}")))?;
            Token::Int(value)
        } else if let Some(word) = caps.get(3) {
            Token::Word(word.as_str().to_string())
        } else if let Some(symbol) = caps.get(4).and_then(|m| m.as_str().chars().next()) {
            Token::Symbol(symbol)
        } else {
            return Err(syntax(query, "unrecognized token".to_string()));
        };
        tokens.push(token);
        rest = &rest[caps.get(0).map_or(rest.len(), |m| m.end())..];
    }
    Ok(tokens)
}

struct Parser<'q> {
    query: &'q str,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser<'_> {
    fn parse_query(mut self) -> Result<GqlQuery, QueryError> {
        self.expect_keyword("SELECT")?;
        self.expect_symbol('*')?;
        self.expect_keyword("FROM")?;
        let kind = self.identifier()?;

        let mut filters = Vec::new();
        if self.accept_keyword("WHERE") {
            loop {
                let field = self.identifier()?;
                self.expect_symbol('=')?;
                let value = self.literal()?;
                filters.push(Filter { field, value });
                if !self.accept_keyword("AND") {
                    break;
                }
            }
        }

        let mut order = Vec::new();
        if self.accept_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let field = self.identifier()?;
                let descending = if self.accept_keyword("DESC") {
                    true
                } else {
                    self.accept_keyword("ASC");
                    false
                };
                order.push(SortKey { field, descending });
                if !self.accept_symbol(',') {
                    break;
                }
            }
        }

        let limit = if self.accept_keyword("LIMIT") {
            Some(self.count()?)
        } else {
            None
        };
        let offset = if self.accept_keyword("OFFSET") {
            self.count()?
        } else {
            0
        };

        if let Some(token) = self.tokens.get(self.position) {
            return Err(self.error(format!("unexpected trailing token {token:?}")));
        }

        Ok(GqlQuery {
            kind,
            filters,
            order,
            limit,
            offset,
        })
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        match self.tokens.get(self.position) {
            Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword) => {
                self.position += 1;
                true
            }
            _ => false,
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), QueryError> {
        if self.accept_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{keyword}`")))
        }
    }

    fn accept_symbol(&mut self, symbol: char) -> bool {
        if self.tokens.get(self.position) == Some(&Token::Symbol(symbol)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), QueryError> {
        if self.accept_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{symbol}`")))
        }
    }

    fn identifier(&mut self) -> Result<String, QueryError> {
        match self.next() {
            Some(Token::Word(word)) => Ok(word),
            other => Err(self.error(format!("expected identifier, found {other:?}"))),
        }
    }

    fn literal(&mut self) -> Result<Value, QueryError> {
        match self.next() {
            Some(Token::Text(text)) => Ok(Value::String(text)),
            Some(Token::Int(number)) => Ok(Value::from(number)),
            other => Err(self.error(format!("expected literal, found {other:?}"))),
        }
    }

    fn count(&mut self) -> Result<usize, QueryError> {
        match self.next() {
            Some(Token::Int(number)) => usize::try_from(number)
                .map_err(|_| self.error(format!("expected non-negative count, found {number}"))),
            other => Err(self.error(format!("expected count, found {other:?}"))),
        }
    }

    fn error(&self, message: String) -> QueryError {
        syntax(self.query, message)
    }
}

fn syntax(query: &str, message: String) -> QueryError {
    QueryError::Syntax {
        query: query.to_string(),
        message,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, SortKey};
    use crate::store::docstore::documents::Document;
    use crate::store::docstore::translate::QueryError;
    use serde_json::json;

    fn document(key: i64, value: serde_json::Value) -> Document {
        Document {
            key,
            properties: value.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn parses_full_query_shape() {
        let query = parse(
            "select * FROM Entry WHERE tags = 'it''s' AND owner = 3 \
             ORDER BY creation_date DESC, __key__ desc LIMIT 5 OFFSET 10",
        )
        .unwrap();

        assert_eq!(query.kind, "Entry");
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0].value, json!("it's"));
        assert_eq!(query.filters[1].value, json!(3));
        assert_eq!(
            query.order,
            vec![
                SortKey {
                    field: "creation_date".to_string(),
                    descending: true
                },
                SortKey {
                    field: "__key__".to_string(),
                    descending: true
                },
            ]
        );
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, 10);
    }

    #[test]
    fn list_property_matches_any_element() {
        let query = parse("SELECT * FROM Entry WHERE tags = 'b'").unwrap();
        assert!(query.matches(&document(1, json!({"tags": ["a", "b"]}))));
        assert!(!query.matches(&document(2, json!({"tags": ["a"]}))));
        assert!(!query.matches(&document(3, json!({}))));
    }

    #[test]
    fn key_pseudo_property_sorts_numerically() {
        let query = parse("SELECT * FROM Entry ORDER BY __key__ DESC").unwrap();
        let older = document(2, json!({}));
        let newer = document(10, json!({}));
        assert_eq!(query.compare(&newer, &older), std::cmp::Ordering::Less);
    }

    #[test]
    fn rejects_unterminated_literal_and_trailing_tokens() {
        assert!(matches!(
            parse("SELECT * FROM Entry WHERE slug = 'oops"),
            Err(QueryError::Syntax { .. })
        ));
        assert!(matches!(
            parse("SELECT * FROM Entry LIMIT 1 garbage"),
            Err(QueryError::Syntax { .. })
        ));
        assert!(matches!(
            parse("DELETE FROM Entry"),
            Err(QueryError::Syntax { .. })
        ));
    }
}
