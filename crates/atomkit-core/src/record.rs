use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row as exchanged with a record store.
pub type Record = serde_json::Map<String, Value>;

/// Equality filter selecting the records whose fields equal every entry.
///
/// Entry order is preserved so filters display and serialize the way they
/// were written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(IndexMap<String, Value>);

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching on a single field.
    #[must_use]
    pub fn by_field(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(field, value)
    }

    /// Add another equality constraint.
    #[must_use]
    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns true when every constraint equals the record's field.
    ///
    /// A missing field never matches, not even a `null` constraint.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

impl FromIterator<(String, Value)> for Filter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<IndexMap<String, Value>> for Filter {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self
            .0
            .iter()
            .map(|(field, value)| format!("{field} = {value}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}
