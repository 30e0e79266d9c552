use crate::config::types::{ConfigLayer, RunConfig};
use crate::ConfigError;
use std::path::Path;

/// Environment variable holding the proxy URL
pub const ENV_PROXY: &str = "PROXY";

/// Environment variable holding the base delay in seconds
pub const ENV_DELAY_BASE: &str = "REQUEST_DELAY_BASE";

/// Environment variable holding the jitter bound in seconds
pub const ENV_DELAY_JITTER: &str = "REQUEST_DELAY_JITTER";

/// Loads a configuration layer from a TOML file
///
/// Every key is optional; unknown keys are rejected.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tgscout::config::load_config_file;
///
/// let layer = load_config_file(Path::new("tgscout.toml")).unwrap();
/// println!("Pages: {:?}", layer.pages);
/// ```
pub fn load_config_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let layer: ConfigLayer = toml::from_str(&content)?;
    Ok(layer)
}

/// Builds a configuration layer from environment variables
///
/// `lookup` abstracts the environment so callers can pass
/// `|name| std::env::var(name).ok()` or a fixed map in tests.
pub fn env_layer<F>(lookup: F) -> Result<ConfigLayer, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(ConfigLayer {
        proxy: lookup(ENV_PROXY),
        delay: env_seconds(&lookup, ENV_DELAY_BASE)?,
        jitter: env_seconds(&lookup, ENV_DELAY_JITTER)?,
        ..Default::default()
    })
}

fn env_seconds<F>(lookup: &F, name: &str) -> Result<Option<f64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ConfigError::Env {
                    name: name.to_string(),
                    value,
                })
        }
        _ => Ok(None),
    }
}

/// Resolves the final run configuration
///
/// Precedence, highest first: command line, environment, config file, defaults.
pub fn resolve_config(
    cli: ConfigLayer,
    env: ConfigLayer,
    file: Option<&Path>,
) -> Result<RunConfig, ConfigError> {
    let file_layer = match file {
        Some(path) => load_config_file(path)?,
        None => ConfigLayer::default(),
    };

    RunConfig::try_from(cli.or(env).or(file_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentType, Target};
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
category = "tech"
type = "chats"
pages = 5
outdir = "./data"
delay = 1.5
max-attempts = 4
proxy = "http://127.0.0.1:8080"
"#,
        );

        let layer = load_config_file(file.path()).unwrap();
        assert_eq!(layer.category.as_deref(), Some("tech"));
        assert_eq!(layer.content_type, Some(ContentType::Chats));
        assert_eq!(layer.pages, Some(5));
        assert_eq!(layer.delay, Some(1.5));
        assert_eq!(layer.max_attempts, Some(4));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config_file(Path::new("/nonexistent/tgscout.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = create_temp_config("max-depth = 3\n");
        assert!(load_config_file(file.path()).is_err());
    }

    #[test]
    fn test_env_layer() {
        let layer = env_layer(env_from(&[
            (ENV_PROXY, "http://proxy:3128"),
            (ENV_DELAY_BASE, "1.25"),
            (ENV_DELAY_JITTER, " "),
        ]))
        .unwrap();

        assert_eq!(layer.proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(layer.delay, Some(1.25));
        assert_eq!(layer.jitter, None);
    }

    #[test]
    fn test_env_layer_rejects_garbage() {
        let result = env_layer(env_from(&[(ENV_DELAY_BASE, "fast")]));
        assert!(matches!(result, Err(ConfigError::Env { .. })));
    }

    #[test]
    fn test_precedence() {
        let file = create_temp_config(
            r#"
url = "https://tgstat.ru/ratings/channels/news"
pages = 5
delay = 2.0
jitter = 1.0
"#,
        );
        let env = env_layer(env_from(&[(ENV_DELAY_BASE, "1.0")])).unwrap();
        let cli = ConfigLayer {
            category: Some("crypto".to_string()),
            pages: Some(2),
            ..Default::default()
        };

        let config = resolve_config(cli, env, Some(file.path())).unwrap();

        // The command-line category replaces the file URL as a whole
        assert_eq!(config.target, Target::Category("crypto".to_string()));
        assert_eq!(config.pages, 2);
        assert_eq!(config.pacing.base_delay, Duration::from_secs(1));
        assert_eq!(config.pacing.jitter, Duration::from_secs(1));
    }
}
