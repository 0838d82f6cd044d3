//! Binding environments for template evaluation.
//!
//! A [`Scope`] is a frame of named values with an optional parent frame.
//! Invoking a template with arguments creates a child scope binding the
//! formal parameters; anything unbound falls through to the caller's scope.

use indexmap::IndexMap;

use crate::value::Value;

/// A chained binding environment.
///
/// Scopes are built per evaluation call and borrow their parent, so child
/// frames live on the evaluator's call stack rather than behind shared
/// ownership.
#[derive(Debug, Clone, Default)]
pub struct Scope<'p> {
    vars: IndexMap<String, Value>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    /// Create an empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root scope from a JSON object. Non-object JSON values
    /// produce an empty scope.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let mut scope = Scope::new();
        if let serde_json::Value::Object(map) = json {
            for (key, value) in map {
                scope.set(key.clone(), Value::from_json(value));
            }
        }
        scope
    }

    /// Create a child scope with the given frame of bindings.
    pub fn child(&'p self, vars: IndexMap<String, Value>) -> Scope<'p> {
        Scope {
            vars,
            parent: Some(self),
        }
    }

    /// Bind a name in this frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Builder-style [`Scope::set`].
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a name, walking parent frames.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|p| p.get(name)),
        }
    }

    /// Whether this frame and all parents are empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.parent.is_none_or(Scope::is_empty)
    }
}
