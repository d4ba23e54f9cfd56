pub mod banned;
pub mod boot;
pub mod diff;
pub mod engine;
pub mod loader;
pub mod scanner;

pub use crate::domain::graph::ModuleGraph;
pub use crate::domain::model::{Dependency, Installation, Module};
pub use crate::domain::ports::{BootOutcome, InstallationLauncher};
pub use crate::utils::error::Result;
