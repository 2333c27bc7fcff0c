//! Entity identity
//!
//! An entity taking part in a workflow is identified by the name of the data
//! provider it belongs to and its identifier inside that provider.

use std::{
    fmt::{self, Display},
    str::FromStr
};

use serde::{Deserialize, Serialize};

use crate::domain::error::WorkflowError;

const SEPARATOR: &str = "::";

/// Value object identifying an entity across providers.
///
/// Serializes to a single string `"provider::id"` which is also used as the
/// storage key for the entity's state history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EntityId {
    provider_name: String,
    identifier:    String
}

impl EntityId {
    /// Create an entity id; integer and string identifiers are both accepted
    pub fn new(provider_name: impl Into<String>, identifier: impl Display) -> Self {
        Self { provider_name: provider_name.into(), identifier: identifier.to_string() }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The identifier as integer, if it is one
    pub fn numeric_identifier(&self) -> Option<i64> {
        self.identifier.parse().ok()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.provider_name, SEPARATOR, self.identifier)
    }
}

impl FromStr for EntityId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(SEPARATOR) {
            Some((provider, identifier)) if !provider.is_empty() && !identifier.is_empty() => {
                Ok(Self::new(provider, identifier))
            }
            _ => Err(WorkflowError::Serialization(format!("invalid entity id \"{}\"", s)))
        }
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EntityId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_form_uses_provider_separator() {
        let id = EntityId::new("tl_news", 4);

        assert_eq!(id.to_string(), "tl_news::4");
        assert_eq!(id.numeric_identifier(), Some(4));
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let id: EntityId = "orders::eu::17".parse().unwrap();

        assert_eq!(id.provider_name(), "orders");
        assert_eq!(id.identifier(), "eu::17");
        assert!("orders".parse::<EntityId>().is_err());
        assert!("::17".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_equality_by_value_and_json_form() {
        let a = EntityId::new("docs", "abc");
        let b: EntityId = serde_json::from_str("\"docs::abc\"").unwrap();

        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"docs::abc\"");
    }
}
