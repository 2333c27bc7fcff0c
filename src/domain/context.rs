//! Transient data carried through one transition attempt

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{domain::security::Role, port::security::RoleChecker};

/// Key-value bag handed to conditions during a transition attempt.
///
/// `properties` are recorded into the resulting state; `payload` holds raw
/// user input (for example submitted form values) and is never recorded.
/// The acting identity decides role-restricted transitions; a context
/// without one is only granted unrestricted transitions.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    payload:    Map<String, Value>,
    #[serde(skip)]
    actor:      Option<Arc<dyn RoleChecker>>
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("properties", &self.properties)
            .field("payload", &self.payload)
            .field("actor", &self.actor.as_ref().map(|actor| actor.identity().to_string()))
            .finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
            && self.payload == other.payload
            && self.actor.as_ref().map(|actor| actor.identity()) == other.actor.as_ref().map(|actor| actor.identity())
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_properties(properties: Map<String, Value>) -> Self {
        Self { properties, payload: Map::new(), actor: None }
    }

    /// Attach the identity attempting the transition
    pub fn with_actor(mut self, actor: Arc<dyn RoleChecker>) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn set_actor(&mut self, actor: Arc<dyn RoleChecker>) -> &mut Self {
        self.actor = Some(actor);
        self
    }

    pub fn actor(&self) -> Option<&dyn RoleChecker> {
        self.actor.as_deref()
    }

    /// True if `roles` is empty or the acting identity holds one of them
    pub fn is_granted(&self, roles: &[Role]) -> bool {
        roles.is_empty() || self.actor.as_ref().is_some_and(|actor| actor.is_granted(roles))
    }

    /// Set a property in the context
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get a property from the context
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn set_payload_value(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn get_payload_value(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Create a child context with additional properties
    pub fn merged_with(&self, properties: Map<String, Value>) -> Self {
        let mut context = self.clone();
        context.properties.extend(properties);
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::security::User;

    #[test]
    fn test_grants_follow_the_actor() {
        let approver = Role::new("review", "approver");
        let anonymous = Context::new();
        let acting = Context::new().with_actor(Arc::new(User::new("ann").with_role(approver.clone())));

        assert!(anonymous.is_granted(&[]));
        assert!(!anonymous.is_granted(std::slice::from_ref(&approver)));
        assert!(acting.is_granted(&[approver]));
        assert_eq!(acting.actor().map(|actor| actor.identity()), Some("ann"));
    }

    #[test]
    fn test_actor_is_not_serialized() {
        let mut context = Context::new().with_actor(Arc::new(User::new("ann")));
        context.set_property("note", "hi");

        let restored: Context = serde_json::from_value(serde_json::to_value(&context).unwrap()).unwrap();

        assert!(restored.actor().is_none());
        assert_eq!(restored.get_property("note"), Some(&Value::from("hi")));
    }
}
