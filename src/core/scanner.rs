use crate::domain::graph::ModuleGraph;
use crate::utils::error::{LayersError, Result};
use std::collections::{BTreeSet, VecDeque};

/// 從所有入口點出發的遞移可達模組集合
///
/// 必要依賴一律跟隨；若目標不在圖中仍記錄為可達（但不再展開），
/// 讓差異引擎能偵測出損壞的安裝。選用依賴只在目標存在時跟隨。
pub fn reachable_from<'a, I>(graph: &ModuleGraph, roots: I) -> Result<BTreeSet<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for root in roots {
        if !graph.contains(root) {
            return Err(LayersError::UnknownRoot {
                module: root.to_string(),
            });
        }
        if visited.insert(root.to_string()) {
            queue.push_back(root);
        }
    }

    while let Some(current) = queue.pop_front() {
        for dep in graph.edges_of(current)? {
            let present = graph.contains(&dep.name);
            if dep.optional && !present {
                continue;
            }
            if !visited.insert(dep.name.clone()) {
                continue;
            }
            if present {
                queue.push_back(dep.name.as_str());
            } else {
                tracing::debug!(
                    "'{}' requires '{}' which has no descriptor",
                    current,
                    dep.name
                );
            }
        }
    }

    Ok(visited)
}
