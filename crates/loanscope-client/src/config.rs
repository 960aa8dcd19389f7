use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Client configuration - optional YAML file plus `LOANSCOPE__` env overrides
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, including the `/api` prefix
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// File holding the bearer credential between runs
    #[serde(default = "default_credential_path")]
    pub credential_path: PathBuf,
}

fn default_server_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_credential_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".loanscope").join("credential")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            credential_path: default_credential_path(),
        }
    }
}

/// Load client config. A missing file is not an error; defaults apply.
pub fn load_config(path: &str) -> Result<ClientConfig> {
    let config: ClientConfig = config::Config::builder()
        .add_source(config::File::new(path, config::FileFormat::Yaml).required(false))
        .add_source(
            config::Environment::with_prefix("LOANSCOPE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to build config from: {}", path))?
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize config from: {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Serialize access to env vars in tests to avoid races between parallel tests
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn test_parse_config() {
        let yaml = r#"
server_url: "https://loans.example.com/api"
credential_path: "/tmp/loanscope/credential"
"#;
        let config: ClientConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.server_url, "https://loans.example.com/api");
        assert_eq!(
            config.credential_path,
            PathBuf::from("/tmp/loanscope/credential")
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let yaml = r#"
server_url: "http://10.0.0.5:8000/api"
"#;
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server_url, "http://10.0.0.5:8000/api");
        assert!(config.credential_path.ends_with(".loanscope/credential"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let config = load_config(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_env_override_server_url() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(b"server_url: \"http://yaml:8000/api\"\n").unwrap();
        file.flush().unwrap();

        // SAFETY: test-only, serialized by ENV_MUTEX
        unsafe {
            std::env::set_var("LOANSCOPE__SERVER_URL", "http://env:9000/api");
        }

        let config = load_config(file.path().to_str().unwrap()).unwrap();

        unsafe {
            std::env::remove_var("LOANSCOPE__SERVER_URL");
        }

        assert_eq!(config.server_url, "http://env:9000/api");
    }
}
