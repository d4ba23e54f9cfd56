use crate::config::CheckKind;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "layers-check")]
#[command(about = "Verify that provisioned server installations match their module graph")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "layers-check.toml")]
    pub config: String,

    /// Feature pack variant whose expectation lists are added to the base lists
    #[arg(long)]
    pub variant: Option<String>,

    /// Checks to run (default: all)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub checks: Vec<CheckKind>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<String>,

    /// Delete the installations after the run
    #[arg(long)]
    pub delete_installations: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn selected_checks(&self) -> Vec<CheckKind> {
        if self.checks.is_empty() {
            CheckKind::ALL.to_vec()
        } else {
            self.checks.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_every_check() {
        let cli = CliConfig::parse_from(["layers-check"]);
        assert_eq!(cli.config, "layers-check.toml");
        assert_eq!(cli.selected_checks(), CheckKind::ALL.to_vec());
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_checks_are_comma_separated() {
        let cli = CliConfig::parse_from([
            "layers-check",
            "--checks",
            "layers,banned",
            "--variant",
            "wildfly-preview",
            "--log-format",
            "json",
        ]);
        assert_eq!(
            cli.selected_checks(),
            vec![CheckKind::Layers, CheckKind::Banned]
        );
        assert_eq!(cli.variant.as_deref(), Some("wildfly-preview"));
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
