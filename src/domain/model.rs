use crate::domain::graph::ModuleGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
}

impl Dependency {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

/// 一個已安裝的模組及其宣告的依賴
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// 不對部署公開；不影響模組之間的依賴解析
    #[serde(default)]
    pub private: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            private: false,
        }
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::required(name));
        self
    }

    pub fn optionally_depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::optional(name));
        self
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }
}

/// 一個已佈建的伺服器安裝目錄
#[derive(Debug, Clone)]
pub struct Installation {
    pub name: String,
    pub path: PathBuf,
    /// 發現此安裝時所在根目錄的名稱，例如 `layers` 或 `servlet`
    pub parent: Option<String>,
    pub root_module: String,
    pub extensions: BTreeSet<String>,
    pub provisioned: BTreeSet<String>,
    pub graph: ModuleGraph,
}

impl Installation {
    /// 以模組圖建立安裝；磁碟上的模組集合即為圖中的節點
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        root_module: impl Into<String>,
        extensions: impl IntoIterator<Item = String>,
        graph: ModuleGraph,
    ) -> Self {
        let provisioned = graph.module_names().map(str::to_string).collect();
        Self {
            name: name.into(),
            path: path.into(),
            parent: None,
            root_module: root_module.into(),
            extensions: extensions.into_iter().collect(),
            provisioned,
            graph,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// 根模組加上所有啟用的擴充
    pub fn entry_points(&self) -> BTreeSet<&str> {
        std::iter::once(self.root_module.as_str())
            .chain(self.extensions.iter().map(String::as_str))
            .collect()
    }

    pub fn provisions(&self, module: &str) -> bool {
        self.provisioned.contains(module)
    }

    /// `parent/name`，僅用於報告
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}/{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}
