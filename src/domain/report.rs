use crate::utils::error::LayersError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// 期望集合與實際集合的雙向差異
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetDiff {
    /// 期望但實際不存在：設定中的排除項目已過時
    pub stale: BTreeSet<String>,
    /// 實際存在但未列入期望：真正的佈建回歸
    pub unexpected: BTreeSet<String>,
}

impl SetDiff {
    pub fn compare(expected: &BTreeSet<String>, actual: &BTreeSet<String>) -> Self {
        Self {
            stale: expected.difference(actual).cloned().collect(),
            unexpected: actual.difference(expected).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.unexpected.is_empty()
    }

    pub fn diff_size(&self) -> usize {
        self.stale.len() + self.unexpected.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffKind {
    Unreferenced,
    UnusedInAllLayers,
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreferenced => write!(f, "unreferenced"),
            Self::UnusedInAllLayers => write!(f, "unused-in-all-layers"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub kind: DiffKind,
    /// 參與比較的安裝名稱
    pub installations: Vec<String>,
    pub actual: BTreeSet<String>,
    pub diff: SetDiff,
}

impl DiffReport {
    pub fn passed(&self) -> bool {
        self.diff.is_empty()
    }

    pub fn to_error(&self) -> Option<LayersError> {
        if self.passed() {
            return None;
        }

        Some(LayersError::DiffMismatch {
            check: format!("{} ({})", self.kind, self.installations.join(" vs ")),
            stale: self.diff.stale.iter().cloned().collect(),
            unexpected: self.diff.unexpected.iter().cloned().collect(),
        })
    }
}

/// 在未獲豁免的安裝中出現的禁用模組
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub installation: String,
    pub parent: Option<String>,
    pub module: String,
    pub path: PathBuf,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}={}", parent, self.installation, self.module),
            None => write!(f, "{}={}", self.installation, self.module),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BootFailureReason {
    Timeout { timeout_secs: u64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootFailure {
    pub installation: String,
    pub path: PathBuf,
    pub reason: BootFailureReason,
}

impl BootFailure {
    pub fn to_error(&self) -> LayersError {
        match &self.reason {
            BootFailureReason::Timeout { timeout_secs } => LayersError::BootTimeout {
                installation: self.installation.clone(),
                timeout_secs: *timeout_secs,
            },
            BootFailureReason::Failed { reason } => LayersError::BootFailed {
                installation: self.installation.clone(),
                reason: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BootSummary {
    pub verified: Vec<String>,
    pub failures: Vec<BootFailure>,
}

/// 一次執行中所有檢查的結果；可回報的問題在此累積後一起呈現
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub diffs: Vec<DiffReport>,
    /// `None` 表示未執行此檢查
    pub banned: Option<Vec<Violation>>,
    pub boot: Option<BootSummary>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            diffs: Vec::new(),
            banned: None,
            boot: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn checks_run(&self) -> usize {
        self.diffs.len() + usize::from(self.banned.is_some()) + usize::from(self.boot.is_some())
    }

    pub fn failures(&self) -> Vec<LayersError> {
        let mut failures: Vec<LayersError> =
            self.diffs.iter().filter_map(DiffReport::to_error).collect();

        if let Some(violations) = self.banned.as_ref().filter(|v| !v.is_empty()) {
            failures.push(LayersError::BannedModuleViolation {
                violations: violations.iter().map(ToString::to_string).collect(),
            });
        }

        if let Some(boot) = &self.boot {
            failures.extend(boot.failures.iter().map(BootFailure::to_error));
        }

        failures
    }

    pub fn to_json(&self) -> crate::utils::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
