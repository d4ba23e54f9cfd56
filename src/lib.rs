pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ProcessLauncher;
pub use config::expectations::{BannedModulesConfig, ExclusionList, ExpectationSet};
pub use config::toml_config::CheckConfig;
pub use config::CheckKind;
pub use core::engine::LayersCheck;
pub use domain::report::RunReport;
pub use utils::error::{LayersError, Result};
