#[cfg(feature = "cli")]
pub mod cli;
pub mod expectations;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use serde::{Deserialize, Serialize};

/// 可個別執行的檢查
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    /// 未引用模組與全層未使用模組
    Layers,
    /// 禁用模組
    Banned,
    /// 預設設定安裝的啟動檢查
    Boot,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [CheckKind::Layers, CheckKind::Banned, CheckKind::Boot];
}
