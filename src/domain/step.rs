use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named node of a workflow graph.
///
/// A step lists, in registration order, the names of the transitions that may
/// be taken from it. A final step offers no transitions at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    name:        String,
    label:       Option<String>,
    transitions: Vec<String>,
    is_final:    bool,
    config:      Map<String, Value>
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), label: None, transitions: Vec::new(), is_final: false, config: Map::new() }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Offer a transition from this step; registering a name twice keeps the first position
    pub fn allow_transition(mut self, transition_name: impl Into<String>) -> Self {
        let transition_name = transition_name.into();
        if !self.transitions.contains(&transition_name) {
            self.transitions.push(transition_name);
        }
        self
    }

    pub fn disallow_transition(mut self, transition_name: &str) -> Self {
        self.transitions.retain(|name| name != transition_name);
        self
    }

    pub fn final_step(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Transition names offered from this step, in registration order
    pub fn allowed_transitions(&self) -> &[String] {
        if self.is_final {
            return &[];
        }

        &self.transitions
    }

    pub fn allows_transition(&self, transition_name: &str) -> bool {
        self.allowed_transitions().iter().any(|name| name == transition_name)
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_step_offers_nothing() {
        let step = Step::new("published").allow_transition("archive").final_step(true);

        assert!(step.allowed_transitions().is_empty());
        assert!(!step.allows_transition("archive"));
    }

    #[test]
    fn test_transitions_keep_registration_order() {
        let step = Step::new("draft").allow_transition("submit").allow_transition("discard").allow_transition("submit");

        assert_eq!(step.allowed_transitions(), &["submit".to_string(), "discard".to_string()]);
        assert_eq!(step.label(), "draft");
    }
}
