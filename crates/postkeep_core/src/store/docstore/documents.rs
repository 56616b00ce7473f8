//! Schema-less document storage grouped by kind.
//!
//! # Invariants
//! - Keys are allocated from one store-wide counter and never reused.
//! - Property maps never contain `__key__`; it is synthesized on read.

use crate::model::entry::RecordId;
use crate::store::docstore::gql::GqlQuery;
use crate::store::RawRecord;
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the key pseudo-property.
pub const KEY_PROPERTY: &str = "__key__";

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: RecordId,
    pub properties: serde_json::Map<String, Value>,
}

impl Document {
    /// Reads a property, resolving `__key__` to the document key.
    pub fn property(&self, name: &str) -> Option<Value> {
        if name == KEY_PROPERTY {
            return Some(Value::from(self.key));
        }
        self.properties.get(name).cloned()
    }

    /// Property map plus `__key__`, as returned by raw queries.
    pub fn to_record(&self) -> RawRecord {
        let mut record = self.properties.clone();
        record.insert(KEY_PROPERTY.to_string(), Value::from(self.key));
        record
    }
}

/// All documents held by one document store.
#[derive(Debug, Default)]
pub struct DocumentDb {
    kinds: BTreeMap<String, Vec<Document>>,
    last_key: RecordId,
}

impl DocumentDb {
    /// Stores a new document of `kind` and returns its allocated key.
    pub fn put(&mut self, kind: &str, mut properties: serde_json::Map<String, Value>) -> RecordId {
        properties.remove(KEY_PROPERTY);
        self.last_key += 1;
        let key = self.last_key;
        self.kinds
            .entry(kind.to_string())
            .or_default()
            .push(Document { key, properties });
        key
    }

    pub fn get(&self, kind: &str, key: RecordId) -> Option<&Document> {
        self.kinds
            .get(kind)
            .and_then(|documents| documents.iter().find(|document| document.key == key))
    }

    pub fn get_mut(&mut self, kind: &str, key: RecordId) -> Option<&mut Document> {
        self.kinds
            .get_mut(kind)
            .and_then(|documents| documents.iter_mut().find(|document| document.key == key))
    }

    /// Runs a parsed query: filter, sort, then offset/limit.
    pub fn run(&self, query: &GqlQuery) -> Vec<&Document> {
        let mut matched = self.matching(query);
        matched.sort_by(|left, right| query.compare(left, right));
        let limit = query.limit.unwrap_or(usize::MAX);
        matched.into_iter().skip(query.offset).take(limit).collect()
    }

    /// Counts documents matching the query filters; ordering and paging are ignored.
    pub fn count(&self, query: &GqlQuery) -> usize {
        self.matching(query).len()
    }

    fn matching(&self, query: &GqlQuery) -> Vec<&Document> {
        self.kinds
            .get(&query.kind)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| query.matches(document))
                    .collect()
            })
            .unwrap_or_default()
    }
}
