use crate::domain::model::{Dependency, Module};
use crate::utils::error::{LayersError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// 有向模組依賴圖：A -> B 代表 A 宣告依賴 B
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: BTreeMap<String, Module>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 重複名稱時以後者為準；需要偵測重複時請使用 [`ModuleGraph::insert`]
    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let mut graph = Self::new();
        for module in modules {
            graph.insert(module);
        }
        graph
    }

    /// 加入模組，回傳被取代的同名模組
    pub fn insert(&mut self, module: Module) -> Option<Module> {
        self.modules.insert(module.name.clone(), module)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.modules.values().map(|m| m.dependencies.len()).sum()
    }

    /// 直接依賴；葉節點回傳空集合
    pub fn dependencies_of(&self, name: &str) -> Result<BTreeSet<&str>> {
        Ok(self
            .edges_of(name)?
            .iter()
            .map(|dep| dep.name.as_str())
            .collect())
    }

    pub(crate) fn edges_of(&self, name: &str) -> Result<&[Dependency]> {
        self.modules
            .get(name)
            .map(|module| module.dependencies.as_slice())
            .ok_or_else(|| LayersError::UnknownModule {
                module: name.to_string(),
            })
    }

    /// 反向邊：哪些模組直接依賴 `name`
    pub fn dependents_of(&self, name: &str) -> Result<BTreeSet<&str>> {
        if !self.contains(name) {
            return Err(LayersError::UnknownModule {
                module: name.to_string(),
            });
        }

        Ok(self
            .modules
            .values()
            .filter(|module| module.dependencies.iter().any(|dep| dep.name == name))
            .map(|module| module.name.as_str())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> ModuleGraph {
        ModuleGraph::from_modules(vec![
            Module::new("root").depends_on("a").optionally_depends_on("b"),
            Module::new("a").depends_on("b"),
            Module::new("b"),
        ])
    }

    #[test]
    fn test_dependencies_of_returns_direct_edges() {
        let graph = sample_graph();

        let deps: Vec<&str> = graph.dependencies_of("root").unwrap().into_iter().collect();
        assert_eq!(deps, vec!["a", "b"]);
        assert!(graph.dependencies_of("b").unwrap().is_empty());
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_dependencies_of_unknown_module() {
        let graph = sample_graph();

        match graph.dependencies_of("nope") {
            Err(LayersError::UnknownModule { module }) => assert_eq!(module, "nope"),
            other => panic!("expected UnknownModule, got {:?}", other),
        }
    }

    #[test]
    fn test_dependents_of() {
        let graph = sample_graph();

        let dependents: Vec<&str> = graph.dependents_of("b").unwrap().into_iter().collect();
        assert_eq!(dependents, vec!["a", "root"]);
        assert!(graph.dependents_of("root").unwrap().is_empty());
        assert!(graph.dependents_of("zzz").is_err());
    }

    #[test]
    fn test_insert_reports_replaced_module() {
        let mut graph = ModuleGraph::new();
        assert!(graph.insert(Module::new("a")).is_none());
        let previous = graph.insert(Module::new("a").depends_on("b"));
        assert_eq!(previous, Some(Module::new("a")));
        assert_eq!(graph.len(), 1);
    }
}
