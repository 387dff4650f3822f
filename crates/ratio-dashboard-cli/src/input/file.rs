use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use ratio_dashboard_core::DashboardConfig;

/// Read a dashboard configuration. `.yaml`/`.yml` files are parsed as YAML,
/// anything else as JSON.
pub fn read_config(path: &str) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let is_yaml = matches!(
        canonical.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        read_yaml(&canonical)
    } else {
        read_json(&canonical)
    }
}

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(value)
}

/// Read a YAML file and deserialise into a typed struct.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let value: T = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(value)
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_dashboard_core::{CategoryFilter, ColorScheme, Year};
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_yaml_config_with_defaults() {
        let file = write_temp(
            ".yaml",
            "companies: [FASING, FEERUM]\ncategory: activity\ncolor_scheme: pastel\n",
        );
        let config = read_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.companies, vec!["FASING", "FEERUM"]);
        assert_eq!(config.category, CategoryFilter::Category("activity".into()));
        assert_eq!(config.color_scheme, ColorScheme::Pastel);
        assert_eq!(config.years, Year::ALL.to_vec());
        assert!(config.show_insights);
    }

    #[test]
    fn test_json_config() {
        let file = write_temp(".json", r#"{"years": ["2023"], "show_raw_data": true}"#);
        let config = read_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.years, vec![Year::Y2023]);
        assert!(config.show_raw_data);
        assert!(config.companies.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let err = read_config("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
