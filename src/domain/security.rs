//! Roles and the reference acting identity

use std::{
    collections::BTreeSet,
    fmt::{self, Display},
    hash::{Hash, Hasher}
};

use serde::{Deserialize, Serialize};

use crate::port::security::RoleChecker;

/// A role defined by a workflow. Identity is the pair `(workflow_name, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub workflow_name: String,
    pub name:          String,
    #[serde(default)]
    pub label:         Option<String>
}

impl Role {
    pub fn new(workflow_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self { workflow_name: workflow_name.into(), name: name.into(), label: None }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Fully qualified name, `workflow:role`
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.workflow_name, self.name)
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.workflow_name == other.workflow_name && self.name == other.name
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.workflow_name.hash(state);
        self.name.hash(state);
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.workflow_name, &self.name).cmp(&(&other.workflow_name, &other.name))
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label.as_deref().unwrap_or(&self.name))
    }
}

/// Acting identity holding a set of roles
#[derive(Debug, Clone, Default)]
pub struct User {
    name:  String,
    roles: BTreeSet<Role>
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), roles: BTreeSet::new() }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn assign_role(&mut self, role: Role) {
        self.roles.insert(role);
    }

    pub fn revoke_role(&mut self, role: &Role) -> bool {
        self.roles.remove(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

impl RoleChecker for User {
    fn is_granted(&self, roles: &[Role]) -> bool {
        roles.is_empty() || roles.iter().any(|role| self.roles.contains(role))
    }

    fn identity(&self) -> &str {
        &self.name
    }
}
