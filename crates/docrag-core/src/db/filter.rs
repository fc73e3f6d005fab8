//! Equality filters over chunk metadata

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EqCondition {
    #[serde(rename = "$eq")]
    eq: Value,
}

/// Conjunction of `field == value` conditions.
///
/// Serializes to `{"field": {"$eq": value}, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataFilter {
    conditions: BTreeMap<String, EqCondition>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-condition filter
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and_eq(field, value)
    }

    /// Restrict to chunks ingested from `source`
    pub fn source(source: impl Into<String>) -> Self {
        Self::eq("source", source.into())
    }

    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .insert(field.into(), EqCondition { eq: value.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check if metadata satisfies every condition
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.conditions
            .iter()
            .all(|(field, cond)| metadata.get(field) == Some(&cond.eq))
    }
}
