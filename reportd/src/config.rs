use report_gateway::config::Config as GatewayConfig;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            level: default_level(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_gateway::filters::RangePolicy;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    const GATEWAY_YAML: &str = r#"
gateway:
    listener:
        host: 0.0.0.0
        port: 8069
    admin_listener:
        host: 127.0.0.1
        port: 8070
    instance: "10018"
    remote:
        base_url: http://10.0.0.2:10014
        api_key: outbound-key
        timeout_secs: 10
    api_keys:
        - key: bi-key
          user: bi
          admin: true
    store:
        snapshot_path: /var/lib/reportd/snapshot.json
"#;

    #[test]
    fn gateway_config() {
        let yaml = format!(
            "metrics:\n    statsd_host: 127.0.0.1\n    statsd_port: 8125\nlogging:\n    sentry_dsn: https://key@sentry.example/1\n    level: debug\n{GATEWAY_YAML}"
        );
        let tmp = write_tmp_file(&yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125
            })
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.sentry_dsn.is_some());

        let gateway = config.gateway;
        assert!(gateway.validate().is_ok());
        assert_eq!(gateway.remote.timeout_secs, 10);
        assert_eq!(gateway.filters.range_policy, RangePolicy::BothBounds);
    }

    #[test]
    fn optional_sections_default() {
        let tmp = write_tmp_file(GATEWAY_YAML);
        let config = Config::from_file(tmp.path()).expect("load config");
        assert_eq!(config.metrics, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn load_errors() {
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/reportd.yaml")),
            Err(ConfigError::LoadError(_))
        ));

        let tmp = write_tmp_file("gateway:\n    instance: 10018\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));

        // Invalid URLs are rejected while parsing
        let tmp = write_tmp_file(&GATEWAY_YAML.replace("http://10.0.0.2:10014", "not a url"));
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
