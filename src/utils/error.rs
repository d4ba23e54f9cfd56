use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayersError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Malformed descriptor {}: {reason}", .path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    #[error("Installation '{installation}' has no root module: {reason}")]
    MissingRoot { installation: String, reason: String },

    #[error("Root module '{module}' is not part of the module graph")]
    UnknownRoot { module: String },

    #[error("Module '{module}' is not part of the module graph")]
    UnknownModule { module: String },

    #[error(
        "Installation '{installation}' references modules that are not provisioned: {}",
        .unprovisioned.join(", ")
    )]
    BrokenInstallation {
        installation: String,
        unprovisioned: Vec<String>,
    },

    #[error("Installation '{name}' not found under {}", .root.display())]
    InstallationNotFound { name: String, root: PathBuf },

    #[error(
        "{check} mismatch: {} unexpected [{}], {} stale [{}]",
        .unexpected.len(),
        .unexpected.join(", "),
        .stale.len(),
        .stale.join(", ")
    )]
    DiffMismatch {
        check: String,
        stale: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("The following banned modules were provisioned: {}", .violations.join(", "))]
    BannedModuleViolation { violations: Vec<String> },

    #[error("Installation '{installation}' did not boot within {timeout_secs}s")]
    BootTimeout {
        installation: String,
        timeout_secs: u64,
    },

    #[error("Installation '{installation}' failed to boot: {reason}")]
    BootFailed {
        installation: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Installation,
    Provisioning,
    Execution,
    System,
}

/// 錯誤嚴重程度，CLI 依此決定退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LayersError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::MalformedDescriptor { .. }
            | Self::MissingRoot { .. }
            | Self::UnknownRoot { .. }
            | Self::InstallationNotFound { .. } => ErrorCategory::Installation,
            Self::BrokenInstallation { .. }
            | Self::DiffMismatch { .. }
            | Self::BannedModuleViolation { .. } => ErrorCategory::Provisioning,
            Self::BootTimeout { .. } | Self::BootFailed { .. } => ErrorCategory::Execution,
            Self::IoError(_)
            | Self::WalkError(_)
            | Self::SerializationError(_)
            | Self::UnknownModule { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DiffMismatch { .. } | Self::BannedModuleViolation { .. } => {
                ErrorSeverity::Medium
            }
            Self::BootTimeout { .. } | Self::BootFailed { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::MalformedDescriptor { .. }
            | Self::MissingRoot { .. }
            | Self::UnknownRoot { .. }
            | Self::InstallationNotFound { .. }
            | Self::BrokenInstallation { .. } => ErrorSeverity::High,
            Self::IoError(_)
            | Self::WalkError(_)
            | Self::SerializationError(_)
            | Self::UnknownModule { .. } => ErrorSeverity::Critical,
        }
    }

    /// 發生錯誤時是否應中止整個執行
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::DiffMismatch { .. }
                | Self::BannedModuleViolation { .. }
                | Self::BootTimeout { .. }
                | Self::BootFailed { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::DiffMismatch { .. } => {
                "Remove stale entries from the expectation lists; investigate unexpected entries as provisioning regressions"
            }
            Self::BannedModuleViolation { .. } => {
                "Remove the banned module from the installation or add the installation to the module's allow-list"
            }
            Self::BrokenInstallation { .. } => {
                "Re-provision the installation; a required dependency is missing from disk"
            }
            Self::MalformedDescriptor { .. } => "Fix or regenerate the module descriptor",
            Self::MissingRoot { .. } | Self::UnknownRoot { .. } => {
                "Check installation.toml: the root module and extensions must have descriptors"
            }
            Self::InstallationNotFound { .. } => {
                "Check the installation names in the configuration and that provisioning ran"
            }
            Self::BootTimeout { .. } => "Increase boot.timeout_seconds or inspect the server log",
            Self::BootFailed { .. } => "Inspect the server output and the boot command configuration",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Check the configuration file",
            Self::UnknownModule { .. } => "This is a graph construction bug; please report it",
            Self::IoError(_) | Self::WalkError(_) => "Check that the paths exist and are readable",
            Self::SerializationError(_) => "Check that the report path is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Installation => format!("Could not load installation: {}", self),
            ErrorCategory::Provisioning => format!("Provisioning check failed: {}", self),
            ErrorCategory::Execution => format!("Boot check failed: {}", self),
            ErrorCategory::System => format!("Unexpected error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayersError>;
