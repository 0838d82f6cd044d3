//! Evaluation configuration.

use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use lgen_core::Value;

/// A custom function callable from template expressions.
pub type CustomFn = dyn Fn(&[Value]) -> Result<Value, String>;

/// Default recursion limit for template calls.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Per-evaluation settings: custom functions and the recursion limit.
///
/// Custom functions shadow builtins and templates of the same name, so a
/// host can override any piece of the function table.
#[derive(Clone)]
pub struct EngineConfig {
    functions: IndexMap<String, Rc<CustomFn>>,
    max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            functions: IndexMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom function.
    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        self.functions.insert(name.into(), Rc::new(function));
        self
    }

    /// Override the template call recursion limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn function(&self, name: &str) -> Option<&Rc<CustomFn>> {
        self.functions.get(name)
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
