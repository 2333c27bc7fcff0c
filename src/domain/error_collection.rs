//! Structured failure reasons collected while evaluating transition guards

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::WorkflowError;

/// One failure reason: a dotted message key, the positional parameters for the
/// message and optionally the collection of sub-failures that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message_key: String,
    #[serde(default)]
    pub params:      Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested:      Option<ErrorCollection>
}

impl ErrorEntry {
    pub fn new(message_key: impl Into<String>, params: Vec<Value>) -> Self {
        Self { message_key: message_key.into(), params, nested: None }
    }

    pub fn with_nested(mut self, nested: ErrorCollection) -> Self {
        self.nested = Some(nested);
        self
    }

    /// Export as `[message_key, params, nested|null]`
    pub fn to_value(&self) -> Value {
        let nested = self.nested.as_ref().map(ErrorCollection::to_array).unwrap_or(Value::Null);

        Value::Array(vec![Value::String(self.message_key.clone()), Value::Array(self.params.clone()), nested])
    }
}

/// Ordered collection of error entries produced during one evaluation pass.
///
/// Entries keep insertion order so reports are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCollection {
    errors: Vec<ErrorEntry>
}

impl ErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new error
    pub fn add_error(
        &mut self,
        message_key: impl Into<String>,
        params: Vec<Value>,
        nested: Option<ErrorCollection>
    ) -> &mut Self {
        self.errors.push(ErrorEntry { message_key: message_key.into(), params, nested });
        self
    }

    pub fn add_entry(&mut self, entry: ErrorEntry) -> &mut Self {
        self.errors.push(entry);
        self
    }

    /// Add a set of errors, keeping their order
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = ErrorEntry>) -> &mut Self {
        self.errors.extend(errors);
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn count_errors(&self) -> usize {
        self.errors.len()
    }

    /// Get an error by its index
    pub fn get_error(&self, index: usize) -> Result<&ErrorEntry, WorkflowError> {
        self.errors.get(index).ok_or(WorkflowError::InvalidIndex(index))
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorEntry> {
        self.errors.iter()
    }

    pub fn reset(&mut self) -> &mut Self {
        self.errors.clear();
        self
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.errors
    }

    /// Export the collection as plain nested arrays.
    ///
    /// Every entry becomes `[message_key, params, nested]` where `nested` is
    /// either `null` or an array of the same shape.
    pub fn to_array(&self) -> Value {
        Value::Array(self.errors.iter().map(ErrorEntry::to_value).collect())
    }
}

impl FromIterator<ErrorEntry> for ErrorCollection {
    fn from_iter<T: IntoIterator<Item = ErrorEntry>>(iter: T) -> Self {
        Self { errors: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type IntoIter = std::slice::Iter<'a, ErrorEntry>;
    type Item = &'a ErrorEntry;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl IntoIterator for ErrorCollection {
    type IntoIter = std::vec::IntoIter<ErrorEntry>;
    type Item = ErrorEntry;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
