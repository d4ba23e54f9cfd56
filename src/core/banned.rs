use crate::config::expectations::BannedModulesConfig;
use crate::domain::model::Installation;
use crate::domain::report::Violation;
use std::collections::BTreeMap;

/// 以 (安裝名稱, 模組名稱) 為鍵的違規集合；空集合代表通過
pub type BannedViolations = BTreeMap<(String, String), Violation>;

/// 掃描所有安裝中的禁用模組
///
/// 豁免只比對安裝名稱，不區分所屬的 parent：`layers/test-all-layers`
/// 與 `servlet/test-all-layers` 會得到相同的豁免結果。
pub fn check_banned(
    installations: &[Installation],
    config: &BannedModulesConfig,
) -> BannedViolations {
    let mut violations = BannedViolations::new();

    for (module, allowed) in config.iter() {
        for installation in installations {
            if !installation.provisions(module) {
                continue;
            }
            if allowed.iter().any(|name| name == &installation.name) {
                tracing::debug!(
                    "'{}' provisions banned '{}' but is allowed to",
                    installation.qualified_name(),
                    module
                );
                continue;
            }

            tracing::warn!(
                "Banned module '{}' provisioned in '{}'",
                module,
                installation.qualified_name()
            );
            let replaced = violations.insert(
                (installation.name.clone(), module.clone()),
                Violation {
                    installation: installation.name.clone(),
                    parent: installation.parent.clone(),
                    module: module.clone(),
                    path: installation.path.clone(),
                },
            );
            // 同名安裝共用同一個鍵，只保留最後一筆
            if let Some(previous) = replaced {
                tracing::warn!(
                    "Violation {} replaced by '{}' with the same installation name",
                    previous,
                    installation.qualified_name()
                );
            }
        }
    }

    violations
}
