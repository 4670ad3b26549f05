use bsc_platform::Platform;
use bsc_source::{pkg_path_key, Range};
use fxhash::FxHashSet;
use indexmap::IndexMap;

/// A component declared by an XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    pub name: String,
    pub xml_pkg_path: String,
    /// Where the name is written in the XML file.
    pub name_range: Range,
    /// The `extends` attribute, as written.
    pub parent_name: Option<String>,
    /// Package paths of the scripts the XML file imports.
    pub scripts: Vec<String>,
}

impl ComponentEntry {
    pub fn new(name: impl Into<String>, xml_pkg_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml_pkg_path: xml_pkg_path.into(),
            name_range: Range::default(),
            parent_name: None,
            scripts: Vec::new(),
        }
    }

    pub fn with_name_range(mut self, range: Range) -> Self {
        self.name_range = range;
        self
    }

    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.parent_name = Some(parent.into());
        self
    }

    pub fn with_scripts<I, S>(mut self, scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripts.extend(scripts.into_iter().map(Into::into));
        self
    }

    pub fn imports(&self, pkg_path: &str) -> bool {
        let key = pkg_path_key(pkg_path);
        self.scripts.iter().any(|script| pkg_path_key(script) == key)
    }
}

/// Every component of the program, keyed by lower-cased component name.
#[derive(Debug, Clone, Default)]
pub struct ComponentDatabase {
    components: IndexMap<String, ComponentEntry>,
}

impl ComponentDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry`, replacing a component of the same name.
    pub fn insert(&mut self, entry: ComponentEntry) -> Option<ComponentEntry> {
        self.components.insert(entry.name.to_lowercase(), entry)
    }

    pub fn remove_by_xml(&mut self, xml_pkg_path: &str) -> Option<ComponentEntry> {
        let key = pkg_path_key(xml_pkg_path);
        let name = self
            .components
            .iter()
            .find(|(_, entry)| pkg_path_key(&entry.xml_pkg_path) == key)
            .map(|(name, _)| name.clone())?;
        self.components.shift_remove(&name)
    }

    pub fn get(&self, name: &str) -> Option<&ComponentEntry> {
        self.components.get(&name.to_lowercase())
    }

    pub fn get_by_xml(&self, xml_pkg_path: &str) -> Option<&ComponentEntry> {
        let key = pkg_path_key(xml_pkg_path);
        self.components
            .values()
            .find(|entry| pkg_path_key(&entry.xml_pkg_path) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentEntry> {
        self.components.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.values().map(|entry| entry.name.as_str())
    }

    /// The ancestors of `name`, nearest first.
    ///
    /// The chain stops at a built-in node type, at an unknown parent, or where
    /// it would revisit a component.
    pub fn ancestors(&self, name: &str) -> Vec<&ComponentEntry> {
        let mut seen = FxHashSet::default();
        seen.insert(name.to_lowercase());
        let mut found = Vec::new();
        let mut current = self.get(name);

        while let Some(parent_name) = current.and_then(|entry| entry.parent_name.as_deref()) {
            if !seen.insert(parent_name.to_lowercase()) {
                log::warn!(
                    "component {} has a circular parent chain through {}; truncating it",
                    name,
                    parent_name
                );
                break;
            }
            match self.get(parent_name) {
                Some(parent) => {
                    found.push(parent);
                    current = Some(parent);
                }
                None => {
                    if !Platform::new().is_scenegraph_node(parent_name) {
                        log::warn!("component {} extends unknown component {}", name, parent_name);
                    }
                    break;
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(entries: Vec<ComponentEntry>) -> ComponentDatabase {
        let mut database = ComponentDatabase::new();
        for entry in entries {
            database.insert(entry);
        }
        database
    }

    fn chain(database: &ComponentDatabase, name: &str) -> Vec<String> {
        database.ancestors(name).iter().map(|entry| entry.name.clone()).collect()
    }

    #[test]
    fn parent_chain_is_nearest_first() {
        let database = database(vec![
            ComponentEntry::new("Base", "components/Base.xml").extending("Group"),
            ComponentEntry::new("Middle", "components/Middle.xml").extending("base"),
            ComponentEntry::new("Leaf", "components/Leaf.xml").extending("Middle"),
        ]);
        assert_eq!(chain(&database, "Leaf"), vec!["Middle", "Base"]);
        assert!(chain(&database, "Base").is_empty());
    }

    #[test]
    fn circular_chains_are_truncated() {
        let _ = env_logger::builder().is_test(true).try_init();
        let database = database(vec![
            ComponentEntry::new("A", "components/A.xml").extending("B"),
            ComponentEntry::new("B", "components/B.xml").extending("A"),
        ]);
        assert_eq!(chain(&database, "A"), vec!["B"]);
        assert_eq!(chain(&database, "B"), vec!["A"]);
    }

    #[test]
    fn lookups_by_xml_path_ignore_case() {
        let mut database = database(vec![ComponentEntry::new("Hero", "components/Hero.xml")
            .with_scripts(["components/Hero.bs"])]);
        assert!(database.get_by_xml("COMPONENTS/hero.xml").is_some());
        assert!(database.get("hero").is_some_and(|entry| entry.imports("components/hero.bs")));
        assert!(database.remove_by_xml("components/hero.xml").is_some());
        assert_eq!(database.names().count(), 0);
    }
}
