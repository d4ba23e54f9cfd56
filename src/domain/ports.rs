use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// 一次啟動嘗試的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootOutcome {
    /// 伺服器正常啟動並關閉
    Clean,
    TimedOut,
    Failed { reason: String },
}

/// 啟動安裝目錄中的伺服器行程
#[async_trait]
pub trait InstallationLauncher: Send + Sync {
    async fn launch(&self, installation: &Path, timeout: Duration) -> Result<BootOutcome>;
}
