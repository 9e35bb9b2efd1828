//! Ordered name/value parameters with unique keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single named value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameValuePair {
    pub name: String,
    pub value: String,
}

impl NameValuePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Insertion-ordered list of parameters keyed by name.
///
/// Keys are unique: upserting an existing name replaces the value in its
/// original position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ParameterList(Vec<NameValuePair>);

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`. Returns `true` when an existing entry was replaced.
    pub fn upsert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.name == name) {
            Some(existing) => {
                existing.value = value;
                true
            }
            None => {
                self.0.push(NameValuePair { name, value });
                false
            }
        }
    }

    pub fn extend_from_map(&mut self, values: &BTreeMap<String, String>) {
        for (name, value) in values {
            self.upsert(name.clone(), value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameValuePair> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|p| p.name == name)
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a NameValuePair;
    type IntoIter = std::slice::Iter<'a, NameValuePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
