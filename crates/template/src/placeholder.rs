//! Scalar placeholder substitution: plain text replacement, no parsing.
use crate::config::TemplateConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::store::MarkupStore;
use crate::value::Value;
use indexmap::IndexMap;

/// One registered mapping of placeholder keys to values, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScalarBatch {
    entries: IndexMap<String, Value>,
}

impl ScalarBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`; an overwritten key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Accepts only a `Map`; anything else is `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => Some(entries.into_iter().collect()),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ScalarBatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut batch = ScalarBatch::new();
        for (k, v) in iter {
            batch.insert(k, v);
        }
        batch
    }
}

impl IntoIterator for ScalarBatch {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Pops and applies batches until `batches` is empty, most recently registered first.
///
/// A marker is replaced at every occurrence, attribute values included, so an earlier
/// batch never sees a marker a later batch already filled. Returns the number of
/// replacements made.
pub fn apply(
    store: &mut MarkupStore,
    batches: &mut Vec<ScalarBatch>,
    config: &TemplateConfig,
    diagnostics: &mut impl Diagnostics,
) -> usize {
    let mut replaced = 0;
    while let Some(batch) = batches.pop() {
        for (key, value) in batch {
            match value {
                Value::Str(s) => replaced += store.replace_all(&config.marker(&key), &s),
                other => diagnostics.report(&Diagnostic::TypeMismatch {
                    key,
                    type_name: other.type_name(),
                }),
            }
        }
    }
    log::debug!(target: "mirage.placeholder", "replaced {replaced} placeholder(s)");
    replaced
}
