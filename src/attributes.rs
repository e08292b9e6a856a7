//! Source-level attributes (`Attribute VB_Exposed = True`)
//!
//! Attributes arrive from the construction phase as a loose mapping from
//! attribute name to a set of values. Consumers that expect a scalar go
//! through [`Attributes::single`], which rejects zero or several values
//! instead of picking one.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VB_EXPOSED: &str = "VB_Exposed";
pub const VB_GLOBAL_NAMESPACE: &str = "VB_GlobalNamespace";
pub const VB_PREDECLARED_ID: &str = "VB_PredeclaredId";
pub const VB_USER_MEM_ID: &str = "VB_UserMemId";

/// Attribute name → values, in insertion order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Vec<String>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to an attribute
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let values = self.0.entry(name.into()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }

    /// Builder form of [`Attributes::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// All values of an attribute
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The value of a scalar attribute.
    ///
    /// Absent attributes yield `Ok(None)`; present attributes must carry
    /// exactly one value.
    pub fn single(&self, name: &str) -> Result<Option<&str>> {
        match self.0.get(name).map(Vec::as_slice) {
            None => Ok(None),
            Some([value]) => Ok(Some(value.as_str())),
            Some(values) => Err(Error::MalformedAttribute {
                name: name.to_string(),
                count: values.len(),
            }),
        }
    }

    /// A boolean scalar attribute: exactly `True` is true, anything else false.
    pub fn flag(&self, name: &str) -> Result<bool> {
        Ok(self
            .single(name)?
            .is_some_and(|value| value == "True"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}
