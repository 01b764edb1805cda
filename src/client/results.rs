//! Immutable projection pipeline over fetched values
//!
//! Every step consumes a [`ResultSet`] and returns a new one, so pipelines
//! read left to right:
//!
//! ```ignore
//! let ids = client
//!     .get("listUsers", &CallArgs::new(), GetOptions::default())
//!     .await?
//!     .extract_key("id", Value::Null)?
//!     .values();
//! ```

use serde_json::{Map, Value};

use super::datasets::DataSetKind;
use crate::error::{Error, Result};

/// Ordered sequence of values produced by one pipeline step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    values: Vec<Value>,
}

impl ResultSet {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Project every element onto the value at `key`.
    ///
    /// Elements without the key yield `default`. The output has one entry per
    /// input element, in the same order, and compound values are kept whole.
    /// Fails on the first element that is not a mapping.
    pub fn extract_key(self, key: &str, default: Value) -> Result<Self> {
        let values = self
            .values
            .into_iter()
            .enumerate()
            .map(|(index, element)| match element {
                Value::Object(mut map) => Ok(map.remove(key).unwrap_or_else(|| default.clone())),
                other => Err(Error::NotAMapping {
                    index,
                    found: kind_name(&other),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { values })
    }

    /// Project onto the `role_user` data set (empty mapping when absent).
    pub fn find_users_missing_2fa(self) -> Result<Self> {
        self.extract_key(DataSetKind::RoleUser.key(), Value::Object(Map::new()))
    }

    /// Project onto the `app_user` data set (empty mapping when absent).
    pub fn find_affected_apps(self) -> Result<Self> {
        self.extract_key(DataSetKind::AppUser.key(), Value::Object(Map::new()))
    }

    /// Log the current values and pass the set through.
    pub fn debug(self) -> Self {
        log::debug!("{}", Value::Array(self.values.clone()));
        self
    }

    /// Finish the pipeline.
    pub fn values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for ResultSet {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl IntoIterator for ResultSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
