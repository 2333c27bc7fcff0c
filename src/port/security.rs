use crate::domain::security::Role;

/// Port answering whether the acting identity may use something restricted to roles
pub trait RoleChecker: Send + Sync {
    /// True if any of the given roles is held. An empty role list is granted.
    fn is_granted(&self, roles: &[Role]) -> bool;

    /// Name used in diagnostics
    fn identity(&self) -> &str;
}
