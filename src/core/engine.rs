use crate::config::expectations::ExpectationSet;
use crate::config::toml_config::CheckConfig;
use crate::config::CheckKind;
use crate::core::banned::check_banned;
use crate::core::boot::verify_all_boot;
use crate::core::diff::{check_unreferenced, check_unused_in_layers};
use crate::core::loader::{load_installations, load_named_installation, remove_installations};
use crate::domain::ports::InstallationLauncher;
use crate::domain::report::{BootSummary, DiffReport, RunReport, Violation};
use crate::utils::error::Result;

/// 依設定執行所選的檢查並彙整成一份報告
pub struct LayersCheck<L: InstallationLauncher> {
    config: CheckConfig,
    expectations: ExpectationSet,
    launcher: L,
}

impl<L: InstallationLauncher> LayersCheck<L> {
    pub fn new(config: CheckConfig, expectations: ExpectationSet, launcher: L) -> Self {
        Self {
            config,
            expectations,
            launcher,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// 參考安裝的未引用檢查，以及參考安裝與全層安裝的比較
    pub fn run_layers(&self) -> Result<Vec<DiffReport>> {
        let root = self.config.install_root();
        let names = &self.config.installations;

        let reference = load_named_installation(&root, &names.reference)?;
        let all_layers = load_named_installation(&root, &names.all_layers)?;

        let unreferenced =
            check_unreferenced(&reference, &self.expectations.expected_unreferenced)?;
        let unused = check_unused_in_layers(
            &reference,
            &all_layers,
            &self.expectations.expected_unused_in_all_layers,
        );

        for report in [&unreferenced, &unused] {
            if report.passed() {
                tracing::info!("✅ {} check passed", report.kind);
            } else {
                tracing::error!(
                    "❌ {} check failed: {} unexpected, {} stale",
                    report.kind,
                    report.diff.unexpected.len(),
                    report.diff.stale.len()
                );
            }
        }

        Ok(vec![unreferenced, unused])
    }

    pub fn run_banned(&self) -> Result<Vec<Violation>> {
        if self.config.banned.is_empty() {
            tracing::info!("No banned modules configured");
            return Ok(Vec::new());
        }

        let install_root = self.config.install_root();
        let mut installations = Vec::new();
        for root in self.config.banned_scan_roots() {
            if root != install_root && !root.is_dir() {
                tracing::warn!("Skipping missing root {}", root.display());
                continue;
            }
            installations.extend(load_installations(&root)?);
        }

        let violations = check_banned(&installations, &self.config.banned);
        if violations.is_empty() {
            tracing::info!(
                "✅ No banned modules in {} installations",
                installations.len()
            );
        }
        Ok(violations.into_values().collect())
    }

    pub async fn run_boot(&self) -> Result<Option<BootSummary>> {
        let Some(root) = self.config.default_configs_root() else {
            tracing::warn!("paths.default_configs_root is not set, skipping boot check");
            return Ok(None);
        };

        let summary = verify_all_boot(&self.launcher, &root, self.config.boot_timeout()).await?;
        tracing::info!(
            "Boot check: {} verified, {} failed",
            summary.verified.len(),
            summary.failures.len()
        );
        Ok(Some(summary))
    }

    /// 致命錯誤立即回傳；可回報的問題累積在報告中
    pub async fn run(&self, checks: &[CheckKind]) -> Result<RunReport> {
        let mut report = RunReport::new();

        if checks.contains(&CheckKind::Layers) {
            report.diffs = self.run_layers()?;
        }
        if checks.contains(&CheckKind::Banned) {
            report.banned = Some(self.run_banned()?);
        }
        if checks.contains(&CheckKind::Boot) {
            report.boot = self.run_boot().await?;
        }

        Ok(report)
    }

    /// 刪除安裝根目錄與預設設定根目錄下的所有安裝
    pub fn cleanup(&self) -> Result<usize> {
        let mut removed = remove_installations(&self.config.install_root())?;
        if let Some(root) = self.config.default_configs_root() {
            removed += remove_installations(&root)?;
        }
        tracing::info!("🧹 Deleted {} installations", removed);
        Ok(removed)
    }
}
