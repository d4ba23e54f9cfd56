use crate::config::expectations::{BannedModulesConfig, ExpectationsConfig};
use crate::utils::error::{LayersError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_BOOT_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub installations: InstallationsConfig,
    #[serde(default)]
    pub expectations: ExpectationsConfig,
    #[serde(default)]
    pub banned: BannedModulesConfig,
    #[serde(default)]
    pub boot: BootConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// 分層佈建的安裝根目錄
    pub install_root: String,
    /// 預設設定檔安裝根目錄，用於啟動檢查
    pub default_configs_root: Option<String>,
    /// 禁用模組檢查額外掃描的根目錄
    #[serde(default)]
    pub extra_roots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallationsConfig {
    #[serde(default = "default_reference")]
    pub reference: String,
    #[serde(default = "default_all_layers")]
    pub all_layers: String,
}

impl Default for InstallationsConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            all_layers: default_all_layers(),
        }
    }
}

fn default_reference() -> String {
    "test-standalone-reference".to_string()
}

fn default_all_layers() -> String {
    "test-all-layers".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootConfig {
    /// 相對於安裝目錄的啟動指令
    #[serde(default = "default_boot_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_boot_timeout")]
    pub timeout_seconds: u64,
    /// 若設定，stdout 出現此字串即視為啟動成功，之後停止伺服器；
    /// 未設定時，啟動指令必須自行以 0 結束
    pub success_marker: Option<String>,
    /// 相對於安裝目錄的停止指令，例如 `bin/jboss-cli.sh`
    pub stop_command: Option<String>,
    #[serde(default)]
    pub stop_args: Vec<String>,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            command: default_boot_command(),
            args: Vec::new(),
            timeout_seconds: default_boot_timeout(),
            success_marker: None,
            stop_command: None,
            stop_args: Vec::new(),
        }
    }
}

fn default_boot_command() -> String {
    "bin/standalone.sh".to_string()
}

fn default_boot_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    #[serde(default)]
    pub delete_installations: bool,
}

impl CheckConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LayersError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LayersError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LAYERS_INSTALL_ROOT})；未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LayersError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_path("paths.install_root", &self.paths.install_root)?;
        if let Some(root) = &self.paths.default_configs_root {
            validate_path("paths.default_configs_root", root)?;
        }
        for root in &self.paths.extra_roots {
            validate_path("paths.extra_roots", root)?;
        }

        validate_non_empty_string("installations.reference", &self.installations.reference)?;
        validate_non_empty_string("installations.all_layers", &self.installations.all_layers)?;
        if self.installations.reference == self.installations.all_layers {
            return Err(LayersError::ConfigValidationError {
                field: "installations".to_string(),
                message: "reference and all_layers must name different installations"
                    .to_string(),
            });
        }

        validate_non_empty_string("boot.command", &self.boot.command)?;
        if let Some(stop) = &self.boot.stop_command {
            validate_non_empty_string("boot.stop_command", stop)?;
        }
        validate_positive_number("boot.timeout_seconds", self.boot.timeout_seconds, 1)?;
        validate_range(
            "boot.timeout_seconds",
            self.boot.timeout_seconds,
            1,
            MAX_BOOT_TIMEOUT_SECONDS,
        )?;

        self.expectations.validate()?;
        self.banned.validate()?;

        Ok(())
    }

    pub fn install_root(&self) -> PathBuf {
        PathBuf::from(&self.paths.install_root)
    }

    pub fn default_configs_root(&self) -> Option<PathBuf> {
        self.paths.default_configs_root.as_ref().map(PathBuf::from)
    }

    /// 禁用模組檢查掃描的所有根目錄
    pub fn banned_scan_roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.install_root())
            .chain(self.paths.extra_roots.iter().map(PathBuf::from))
            .collect()
    }

    pub fn boot_timeout(&self) -> Duration {
        Duration::from_secs(self.boot.timeout_seconds)
    }
}

impl Validate for CheckConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[paths]
install_root = "/tmp/layers"
default_configs_root = "/tmp/default-configs"

[expectations]
variant = "wildfly-ee"

[expectations.base]
unreferenced = ["org.jboss.as.console"]
unused_in_all_layers = ["javax.api"]

[expectations.variants.wildfly-ee]
unreferenced = ["wildflyee.api"]

[banned]
"org.jboss.as.security" = ["test-all-layers"]

[boot]
timeout_seconds = 30
"#;

        let config = CheckConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.install_root(), PathBuf::from("/tmp/layers"));
        assert_eq!(config.installations.reference, "test-standalone-reference");
        assert_eq!(config.installations.all_layers, "test-all-layers");
        assert_eq!(config.boot.command, "bin/standalone.sh");
        assert_eq!(config.boot_timeout(), Duration::from_secs(30));
        assert!(!config.cleanup.delete_installations);
        assert!(config.validate().is_ok());

        let expectations = config.expectations.resolve(None).unwrap();
        assert_eq!(expectations.expected_unreferenced.len(), 2);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LAYERS_CHECK_TEST_ROOT", "/srv/layers");

        let toml_content = r#"
[paths]
install_root = "${LAYERS_CHECK_TEST_ROOT}"
"#;

        let config = CheckConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.paths.install_root, "/srv/layers");

        std::env::remove_var("LAYERS_CHECK_TEST_ROOT");
    }

    #[test]
    fn test_unresolved_env_var_fails_validation() {
        let toml_content = r#"
[paths]
install_root = "${LAYERS_CHECK_UNDEFINED_VARIABLE}"
"#;

        let config = CheckConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[paths]
install_root = "/tmp/layers"

[installations]
reference = "same"
all_layers = "same"
"#;

        let config = CheckConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[paths]
install_root = "/tmp/layers"

[boot]
timeout_seconds = 0
"#;
        let config = CheckConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let toml_content = r#"
[paths]
install_root = "/tmp/layers"
typo_root = "/tmp"
"#;

        assert!(CheckConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[paths]
install_root = "/tmp/layers"
extra_roots = ["/tmp/servlet"]
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = CheckConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.banned_scan_roots(),
            vec![PathBuf::from("/tmp/layers"), PathBuf::from("/tmp/servlet")]
        );
        assert!(config.default_configs_root().is_none());
    }

    #[test]
    fn test_example_config_parses() {
        let config =
            CheckConfig::from_toml_str(include_str!("../../layers-check.example.toml")).unwrap();

        let preview = config.expectations.resolve(Some("wildfly-preview")).unwrap();
        assert!(preview
            .expected_unreferenced
            .contains("org.apache.avro"));
        assert!(preview
            .expected_unused_in_all_layers
            .contains("javax.api"));

        assert_eq!(config.boot.stop_command.as_deref(), Some("bin/jboss-cli.sh"));
        assert_eq!(config.boot.success_marker.as_deref(), Some("started in"));

        let default = config.expectations.resolve(None).unwrap();
        assert!(!default.expected_unreferenced.contains("org.apache.avro"));
        assert_eq!(
            config.banned.allowed_for("org.jboss.as.security").map(|a| a.len()),
            Some(4)
        );
    }
}
