use crate::utils::error::{LayersError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    // 未替換的環境變數代表設定不完整
    if path.contains("${") {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains an unresolved environment variable".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// 模組名稱：以 `.` 或 `-` 分隔的命名空間，不允許空白或空段落
pub fn validate_module_name(field_name: &str, name: &str) -> Result<()> {
    let invalid = |reason: &str| LayersError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("Module name cannot be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("Module name cannot contain whitespace"));
    }
    if name.split('.').any(str::is_empty) {
        return Err(invalid("Module name has an empty namespace segment"));
    }
    Ok(())
}

pub fn validate_module_names<'a>(
    field_name: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<()> {
    for name in names {
        validate_module_name(field_name, name)?;
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LayersError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("paths.install_root", "/tmp/layers").is_ok());
        assert!(validate_path("paths.install_root", "").is_err());
        assert!(validate_path("paths.install_root", "${LAYERS_INSTALL_ROOT}").is_err());
    }

    #[test]
    fn test_validate_module_name() {
        assert!(validate_module_name("banned", "org.jboss.as.security").is_ok());
        assert!(validate_module_name("banned", "org.wildfly.extension.datasources-agroal").is_ok());
        assert!(validate_module_name("banned", "").is_err());
        assert!(validate_module_name("banned", "org..jboss").is_err());
        assert!(validate_module_name("banned", "org.jboss as").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("boot.timeout_seconds", 60u64, 1, 3600).is_ok());
        assert!(validate_range("boot.timeout_seconds", 0u64, 1, 3600).is_err());
    }
}
