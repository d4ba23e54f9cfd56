use crate::domain::graph::ModuleGraph;
use crate::domain::model::{Dependency, Installation, Module};
use crate::utils::error::{LayersError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "installation.toml";
pub const DESCRIPTOR_FILE: &str = "module.toml";
const DEFAULT_MODULES_DIR: &str = "modules";

/// `installation.toml`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstallationManifest {
    name: Option<String>,
    root_module: Option<String>,
    #[serde(default)]
    extensions: Vec<String>,
    modules_dir: Option<String>,
}

/// `module.toml`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDescriptor {
    name: String,
    #[serde(default)]
    private: bool,
    /// 別名模組：唯一的必要依賴就是目標模組
    alias_of: Option<String>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

impl ModuleDescriptor {
    fn into_module(self) -> Module {
        let mut dependencies = self.dependencies;
        if let Some(target) = self.alias_of {
            dependencies.push(Dependency::required(target));
        }
        Module {
            name: self.name,
            dependencies,
            private: self.private,
        }
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn parse_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| LayersError::MalformedDescriptor {
        path: path.to_path_buf(),
        reason: e.message().to_string(),
    })
}

/// 載入單一安裝目錄並建立模組圖
pub fn load_installation(path: &Path) -> Result<Installation> {
    let dir_label = dir_name(path);
    let manifest_path = path.join(MANIFEST_FILE);

    if !manifest_path.is_file() {
        return Err(LayersError::MissingRoot {
            installation: dir_label,
            reason: format!("{} not found in {}", MANIFEST_FILE, path.display()),
        });
    }

    let manifest: InstallationManifest = parse_toml(&manifest_path)?;
    let name = manifest.name.unwrap_or(dir_label);

    let root_module = match manifest.root_module {
        Some(root) if !root.trim().is_empty() => root,
        _ => {
            return Err(LayersError::MissingRoot {
                installation: name,
                reason: format!("{} does not declare root_module", MANIFEST_FILE),
            })
        }
    };

    let modules_dir = path.join(
        manifest
            .modules_dir
            .as_deref()
            .unwrap_or(DEFAULT_MODULES_DIR),
    );
    let graph = load_module_graph(&modules_dir)?;

    if !graph.contains(&root_module) {
        return Err(LayersError::MissingRoot {
            installation: name,
            reason: format!("root module '{}' has no descriptor", root_module),
        });
    }

    tracing::debug!(
        "Loaded installation '{}': {} modules, {} edges, {} extensions",
        name,
        graph.len(),
        graph.edge_count(),
        manifest.extensions.len()
    );

    Ok(Installation::new(
        name,
        path,
        root_module,
        manifest.extensions,
        graph,
    ))
}

/// 掃描目錄下所有 `module.toml`；同名模組出現兩次視為描述檔錯誤
pub fn load_module_graph(modules_dir: &Path) -> Result<ModuleGraph> {
    let mut graph = ModuleGraph::new();
    if !modules_dir.is_dir() {
        tracing::warn!("Modules directory {} does not exist", modules_dir.display());
        return Ok(graph);
    }

    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();

    for entry in WalkDir::new(modules_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name() != DESCRIPTOR_FILE {
            continue;
        }

        let descriptor: ModuleDescriptor = parse_toml(entry.path())?;
        let module = descriptor.into_module();

        if let Some(first) = origins.get(&module.name) {
            return Err(LayersError::MalformedDescriptor {
                path: entry.path().to_path_buf(),
                reason: format!(
                    "module '{}' is already declared by {}",
                    module.name,
                    first.display()
                ),
            });
        }

        origins.insert(module.name.clone(), entry.path().to_path_buf());
        graph.insert(module);
    }

    Ok(graph)
}

/// 根目錄下含有 `installation.toml` 的子目錄，依路徑排序
pub fn discover_installations(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() && path.join(MANIFEST_FILE).is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// 載入根目錄下所有安裝，並以根目錄名稱作為 parent
pub fn load_installations(root: &Path) -> Result<Vec<Installation>> {
    let parent = dir_name(root);
    let paths = discover_installations(root)?;
    tracing::info!("Found {} installations under {}", paths.len(), root.display());

    paths
        .iter()
        .map(|path| load_installation(path).map(|inst| inst.with_parent(parent.clone())))
        .collect()
}

/// 依目錄名稱載入根目錄下的指定安裝
pub fn load_named_installation(root: &Path, name: &str) -> Result<Installation> {
    let path = root.join(name);
    if !path.join(MANIFEST_FILE).is_file() {
        return Err(LayersError::InstallationNotFound {
            name: name.to_string(),
            root: root.to_path_buf(),
        });
    }

    Ok(load_installation(&path)?.with_parent(dir_name(root)))
}

/// 刪除根目錄下所有已發現的安裝目錄，回傳刪除數量
pub fn remove_installations(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }

    let paths = discover_installations(root)?;
    for path in &paths {
        tracing::debug!("Deleting installation {}", path.display());
        fs::remove_dir_all(path)?;
    }
    Ok(paths.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn write_module(install: &Path, name: &str, body: &str) {
        let dir = install.join("modules").join(name.replace('.', "/")).join("main");
        write(
            &dir.join(DESCRIPTOR_FILE),
            &format!("name = \"{}\"\n{}", name, body),
        );
    }

    #[test]
    fn test_load_installation_builds_graph() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("test-standalone-reference");
        write(
            &install.join(MANIFEST_FILE),
            "root_module = \"org.root\"\nextensions = [\"org.ext\"]\n",
        );
        write_module(
            &install,
            "org.root",
            "[[dependencies]]\nname = \"org.a\"\n\n[[dependencies]]\nname = \"org.gone\"\noptional = true\n",
        );
        write_module(&install, "org.a", "private = true\n");
        write_module(&install, "org.ext", "");
        write_module(&install, "org.alias", "alias_of = \"org.a\"\n");

        let installation = load_installation(&install).unwrap();

        assert_eq!(installation.name, "test-standalone-reference");
        assert_eq!(installation.root_module, "org.root");
        assert_eq!(installation.provisioned.len(), 4);
        assert!(installation.graph.module("org.a").unwrap().private);
        let root_deps: Vec<&str> = installation
            .graph
            .dependencies_of("org.root")
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(root_deps, vec!["org.a", "org.gone"]);
        let alias_deps: Vec<&str> = installation
            .graph
            .dependencies_of("org.alias")
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(alias_deps, vec!["org.a"]);
    }

    #[test]
    fn test_manifest_name_overrides_directory() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("dir");
        write(
            &install.join(MANIFEST_FILE),
            "name = \"custom\"\nroot_module = \"r\"\n",
        );
        write_module(&install, "r", "");

        assert_eq!(load_installation(&install).unwrap().name, "custom");
    }

    #[test]
    fn test_missing_manifest_is_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = load_installation(temp.path());
        assert!(matches!(result, Err(LayersError::MissingRoot { .. })));
    }

    #[test]
    fn test_root_without_descriptor_is_missing_root() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join(MANIFEST_FILE), "root_module = \"r\"\n");
        write_module(temp.path(), "other", "");

        match load_installation(temp.path()) {
            Err(LayersError::MissingRoot { reason, .. }) => assert!(reason.contains("'r'")),
            other => panic!("expected MissingRoot, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_descriptor() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join(MANIFEST_FILE), "root_module = \"r\"\n");
        write(
            &temp.path().join("modules/r/main").join(DESCRIPTOR_FILE),
            "name = \"r\"\ndependencies = \"not-a-list\"\n",
        );

        match load_installation(temp.path()) {
            Err(LayersError::MalformedDescriptor { path, .. }) => {
                assert!(path.ends_with("modules/r/main/module.toml"))
            }
            other => panic!("expected MalformedDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_module_is_malformed() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join(MANIFEST_FILE), "root_module = \"r\"\n");
        write(&temp.path().join("modules/a/module.toml"), "name = \"r\"\n");
        write(&temp.path().join("modules/b/module.toml"), "name = \"r\"\n");

        let result = load_installation(temp.path());
        assert!(matches!(
            result,
            Err(LayersError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn test_discover_and_remove_installations() {
        let temp = TempDir::new().unwrap();
        for name in ["b-inst", "a-inst"] {
            let install = temp.path().join(name);
            write(&install.join(MANIFEST_FILE), "root_module = \"r\"\n");
            write_module(&install, "r", "");
        }
        fs::create_dir_all(temp.path().join("not-an-installation")).unwrap();

        let found = discover_installations(temp.path()).unwrap();
        let names: Vec<String> = found.iter().map(|p| dir_name(p)).collect();
        assert_eq!(names, vec!["a-inst", "b-inst"]);

        let loaded = load_installations(temp.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].parent.as_deref(), Some(dir_name(temp.path()).as_str()));
        assert_eq!(
            load_named_installation(temp.path(), "b-inst").unwrap().name,
            "b-inst"
        );
        assert!(matches!(
            load_named_installation(temp.path(), "zzz"),
            Err(LayersError::InstallationNotFound { .. })
        ));

        assert_eq!(remove_installations(temp.path()).unwrap(), 2);
        assert!(temp.path().join("not-an-installation").exists());
        assert!(!temp.path().join("a-inst").exists());
    }
}
