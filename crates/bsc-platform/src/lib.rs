//! What the Roku platform provides out of the box.
//!
//! The tables are static and built once on first use. A `Platform` value adds
//! the project's own components to the set of node types, so that
//! `CreateObject("roSGNode", "MyComponent")` validates against both.

pub mod components;
pub mod functions;
pub mod nodes;

pub use components::BrightScriptComponent;
pub use functions::GlobalFunction;

use fxhash::FxHashSet;

#[derive(Debug, Clone, Default)]
pub struct Platform {
    custom_nodes: FxHashSet<String>,
}

impl Platform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept the given component names as node types.
    pub fn with_custom_nodes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.custom_nodes
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        self
    }

    pub fn is_scenegraph_node(&self, name: &str) -> bool {
        nodes::is_builtin_node(name) || self.custom_nodes.contains(&name.to_lowercase())
    }

    pub fn component(&self, name: &str) -> Option<&'static BrightScriptComponent> {
        components::lookup(name)
    }

    pub fn global_function(&self, name: &str) -> Option<&'static GlobalFunction> {
        functions::lookup(name)
    }

    /// Every global function, in name order.
    pub fn global_functions(&self) -> impl Iterator<Item = &'static GlobalFunction> {
        functions::GLOBAL_FUNCTIONS.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_nodes_extend_builtins() {
        let platform = Platform::new().with_custom_nodes(["HeroScreen"]);
        assert!(platform.is_scenegraph_node("heroscreen"));
        assert!(platform.is_scenegraph_node("Poster"));
        assert!(!Platform::new().is_scenegraph_node("HeroScreen"));
    }

    #[test]
    fn global_functions_are_sorted() {
        let names: Vec<String> = Platform::new().global_functions().map(|f| f.name.to_lowercase()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
