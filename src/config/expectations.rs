use crate::utils::error::{LayersError, Result};
use crate::utils::validation::{validate_module_name, validate_module_names, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 一組排除清單，可為共用基底或某個 feature pack 變體的追加項目
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExclusionList {
    /// 已佈建但刻意不被引用的模組
    #[serde(default)]
    pub unreferenced: BTreeSet<String>,
    /// 參考安裝有、全層安裝刻意沒有的模組
    #[serde(default)]
    pub unused_in_all_layers: BTreeSet<String>,
}

/// 單次執行使用的期望集合，執行期間不可變
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectationSet {
    pub expected_unreferenced: BTreeSet<String>,
    pub expected_unused_in_all_layers: BTreeSet<String>,
}

impl ExpectationSet {
    /// 基底清單加上各變體的追加項目
    pub fn compose<'a>(
        base: &ExclusionList,
        additions: impl IntoIterator<Item = &'a ExclusionList>,
    ) -> Self {
        let mut set = Self {
            expected_unreferenced: base.unreferenced.clone(),
            expected_unused_in_all_layers: base.unused_in_all_layers.clone(),
        };
        for addition in additions {
            set.expected_unreferenced
                .extend(addition.unreferenced.iter().cloned());
            set.expected_unused_in_all_layers
                .extend(addition.unused_in_all_layers.iter().cloned());
        }
        set
    }
}

/// `[expectations]` 區段
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationsConfig {
    /// 預設使用的變體，可由 `--variant` 覆蓋
    pub variant: Option<String>,
    #[serde(default)]
    pub base: ExclusionList,
    #[serde(default)]
    pub variants: BTreeMap<String, ExclusionList>,
}

impl ExpectationsConfig {
    pub fn resolve(&self, variant_override: Option<&str>) -> Result<ExpectationSet> {
        let variant = variant_override.or(self.variant.as_deref());

        match variant {
            None => Ok(ExpectationSet::compose(&self.base, std::iter::empty::<&ExclusionList>())),
            Some(name) => {
                let additions =
                    self.variants
                        .get(name)
                        .ok_or_else(|| LayersError::InvalidConfigValueError {
                            field: "expectations.variant".to_string(),
                            value: name.to_string(),
                            reason: format!(
                                "Unknown variant. Known variants: {}",
                                self.variants.keys().cloned().collect::<Vec<_>>().join(", ")
                            ),
                        })?;
                tracing::info!("Using expectation variant '{}'", name);
                Ok(ExpectationSet::compose(&self.base, [additions]))
            }
        }
    }
}

impl Validate for ExpectationsConfig {
    fn validate(&self) -> Result<()> {
        validate_module_names("expectations.base.unreferenced", &self.base.unreferenced)?;
        validate_module_names(
            "expectations.base.unused_in_all_layers",
            &self.base.unused_in_all_layers,
        )?;
        for (name, list) in &self.variants {
            validate_module_names(
                &format!("expectations.variants.{}.unreferenced", name),
                &list.unreferenced,
            )?;
            validate_module_names(
                &format!("expectations.variants.{}.unused_in_all_layers", name),
                &list.unused_in_all_layers,
            )?;
        }
        Ok(())
    }
}

/// 禁用模組 -> 允許佈建它的安裝名稱
///
/// 只以安裝名稱比對，不區分安裝所在的 parent 目錄。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BannedModulesConfig(BTreeMap<String, Vec<String>>);

impl BannedModulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ban(&mut self, module: impl Into<String>, allowed: Vec<String>) {
        self.0.insert(module.into(), allowed);
    }

    pub fn allowed_for(&self, module: &str) -> Option<&[String]> {
        self.0.get(module).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for BannedModulesConfig {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Validate for BannedModulesConfig {
    fn validate(&self) -> Result<()> {
        for module in self.0.keys() {
            validate_module_name("banned", module)?;
        }
        Ok(())
    }
}
