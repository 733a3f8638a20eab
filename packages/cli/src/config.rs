use folio_editor::EditorConfig;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Load `folio.config.json` from `cwd`, falling back to defaults
pub fn load(cwd: &str) -> anyhow::Result<EditorConfig> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let config: EditorConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", config_path.display(), e))?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        Ok(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_editor::PaperSize;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("folio-cli-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = temp_dir("defaults");
        let config = load(dir.to_str().unwrap()).unwrap();
        assert_eq!(config, EditorConfig::default());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_load_config_file() {
        let dir = temp_dir("load");
        std::fs::write(
            dir.join(DEFAULT_CONFIG_NAME),
            r#"{ "paper": "a5", "historyLimit": 10 }"#,
        )
        .unwrap();

        let config = load(dir.to_str().unwrap()).unwrap();
        assert_eq!(config.paper, PaperSize::A5);
        assert_eq!(config.history_limit, 10);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_invalid_config_names_file() {
        let dir = temp_dir("invalid");
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{ "paper": "tabloid" }"#).unwrap();

        let err = load(dir.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains(DEFAULT_CONFIG_NAME));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
