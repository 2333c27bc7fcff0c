use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{
    domain::{
        constant::message,
        context::Context,
        error_collection::{ErrorCollection, ErrorEntry},
        item::Item,
        transition::Transition
    },
    port::condition::{Condition, DescribeError}
};

/// Signature of a custom guard predicate
pub type Predicate = dyn Fn(&Transition, &Item, &Context) -> bool + Send + Sync;

/// Leaf condition delegating to a registered predicate
#[derive(Clone)]
pub struct CallbackCondition {
    name:        String,
    message_key: String,
    params:      Vec<Value>,
    predicate:   Arc<Predicate>
}

impl CallbackCondition {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Transition, &Item, &Context) -> bool + Send + Sync + 'static
    {
        Self::from_shared(name, Arc::new(predicate))
    }

    pub fn from_shared(name: impl Into<String>, predicate: Arc<Predicate>) -> Self {
        let name = name.into();
        Self { params: vec![Value::String(name.clone())], name, message_key: message::CALLBACK.to_string(), predicate }
    }

    /// Report failures under a custom message key instead of the generic one
    pub fn with_message_key(mut self, message_key: impl Into<String>) -> Self {
        self.message_key = message_key.into();
        self
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CallbackCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackCondition")
            .field("name", &self.name)
            .field("message_key", &self.message_key)
            .finish_non_exhaustive()
    }
}

impl DescribeError for CallbackCondition {
    fn describe_error(&self, _transition: &Transition, _item: &Item, _context: &Context) -> ErrorEntry {
        ErrorEntry::new(self.message_key.clone(), self.params.clone())
    }
}

impl Condition for CallbackCondition {
    fn matches(&self, transition: &Transition, item: &Item, context: &Context, errors: &mut ErrorCollection) -> bool {
        if (self.predicate)(transition, item, context) {
            return true;
        }

        errors.add_entry(self.describe_error(transition, item, context));
        false
    }
}
