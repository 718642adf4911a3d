use crate::filters::RangePolicy;
use crate::reports::ReportKind;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Instance name cannot be empty")]
    EmptyInstance,

    #[error("Remote API key cannot be empty")]
    EmptyRemoteApiKey,

    #[error("Remote timeout must be at least one second")]
    InvalidTimeout,

    #[error("Empty API key for user {0}")]
    EmptyApiKey(String),

    #[error("Duplicate API key (second use by user {0})")]
    DuplicateApiKey(String),

    #[error("Reporting currency cannot be empty")]
    EmptyReportingCurrency,

    #[error("Conversion rate for {0} must be positive")]
    InvalidRate(String),
}

/// Report gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener serving the report endpoints
    pub listener: Listener,
    /// Listener serving health and readiness probes
    pub admin_listener: Listener,
    /// Provenance tag stamped on every local record (e.g. "10018")
    pub instance: String,
    /// The second deployment queried for its copy of every report
    pub remote: RemoteConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Keys accepted on inbound requests
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
    pub store: StoreConfig,
    /// Per-report overrides of the defaults derived from `remote`
    #[serde(default)]
    pub endpoints: HashMap<ReportKind, EndpointConfig>,
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.instance.trim().is_empty() {
            return Err(ValidationError::EmptyInstance);
        }

        self.remote.validate()?;
        self.currency.validate()?;

        let mut keys = HashSet::new();
        for api_key in &self.api_keys {
            if api_key.key.trim().is_empty() {
                return Err(ValidationError::EmptyApiKey(api_key.user.clone()));
            }
            if !keys.insert(api_key.key.as_str()) {
                return Err(ValidationError::DuplicateApiKey(api_key.user.clone()));
            }
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Scheme and authority of the remote deployment. Report paths are
    /// joined onto it unless an endpoint override gives a full URL.
    pub base_url: Url,
    /// Outbound credential sent in the `Authorization` header
    pub api_key: String,
    /// Upper bound on one remote fetch, connection to last body byte
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.trim().is_empty() {
            return Err(ValidationError::EmptyRemoteApiKey);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FilterConfig {
    #[serde(default)]
    pub range_policy: RangePolicy,
}

fn default_reporting_currency() -> String {
    "MAD".to_string()
}

fn default_rates() -> HashMap<String, f64> {
    HashMap::from([("EUR".to_string(), 11.2), ("USD".to_string(), 9.75)])
}

/// Fixed conversion table into the reporting currency
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CurrencyConfig {
    #[serde(default = "default_reporting_currency")]
    pub reporting: String,
    /// Units of reporting currency per unit of the keyed currency
    #[serde(default = "default_rates")]
    pub rates: HashMap<String, f64>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        CurrencyConfig {
            reporting: default_reporting_currency(),
            rates: default_rates(),
        }
    }
}

impl CurrencyConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reporting.trim().is_empty() {
            return Err(ValidationError::EmptyReportingCurrency);
        }
        for (code, rate) in &self.rates {
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(ValidationError::InvalidRate(code.clone()));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiKeyConfig {
    pub key: String,
    /// Name of the principal the key resolves to
    pub user: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// JSON snapshot of the local business records
    pub snapshot_path: PathBuf,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// Full remote URL for this report
    pub remote_url: Option<Url>,
    /// Overrides whether the report needs an admin principal
    pub require_admin: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_YAML: &str = r#"
listener:
    host: "0.0.0.0"
    port: 8069
admin_listener:
    host: "127.0.0.1"
    port: 8070
instance: "10018"
remote:
    base_url: "http://10.0.0.2:10014"
    api_key: "outbound-key"
filters:
    range_policy: open_ended
api_keys:
    - key: "bi-key"
      user: bi
      admin: true
    - key: "pos-key"
      user: pos
      active: false
store:
    snapshot_path: /var/lib/reportd/snapshot.json
endpoints:
    stock_valuation:
        remote_url: "http://10.0.0.3:10014/api/stock_valuation"
    dimension_product:
        require_admin: false
"#;

    fn base_config() -> Config {
        serde_yaml::from_str(VALID_YAML).unwrap()
    }

    #[test]
    fn test_parse_valid_config() {
        let config = base_config();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 8069);
        assert_eq!(config.instance, "10018");
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.filters.range_policy, RangePolicy::OpenEnded);
        assert_eq!(config.currency, CurrencyConfig::default());
        assert_eq!(config.currency.rates.get("EUR"), Some(&11.2));
        assert!(config.api_keys[0].active);
        assert!(config.api_keys[0].admin);
        assert!(!config.api_keys[1].active);
        assert!(!config.api_keys[1].admin);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(
            config.endpoints[&ReportKind::DimensionProduct].require_admin,
            Some(false)
        );
        assert!(
            config.endpoints[&ReportKind::StockValuation]
                .remote_url
                .is_some()
        );
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
listener: {host: "0.0.0.0", port: 8069}
admin_listener: {host: "127.0.0.1", port: 8070}
instance: "10018"
remote: {base_url: "http://10.0.0.2:10014", api_key: "k", timeout_secs: 5}
currency: {reporting: EUR}
store: {snapshot_path: snapshot.json}
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.filters.range_policy, RangePolicy::BothBounds);
        assert_eq!(config.currency.reporting, "EUR");
        assert_eq!(config.currency.rates.len(), 2);
        assert!(config.api_keys.is_empty());
        assert!(config.endpoints.is_empty());
        assert_eq!(config.remote.timeout_secs, 5);
    }

    #[test]
    fn test_validation_errors() {
        let base = base_config();

        let mut config = base.clone();
        config.admin_listener.port = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPort));

        let mut config = base.clone();
        config.instance = " ".to_string();
        assert_eq!(config.validate(), Err(ValidationError::EmptyInstance));

        let mut config = base.clone();
        config.remote.api_key = String::new();
        assert_eq!(config.validate(), Err(ValidationError::EmptyRemoteApiKey));

        let mut config = base.clone();
        config.remote.timeout_secs = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));

        let mut config = base.clone();
        config.api_keys[1].key = "bi-key".to_string();
        assert_eq!(
            config.validate(),
            Err(ValidationError::DuplicateApiKey("pos".to_string()))
        );

        let mut config = base.clone();
        config.api_keys[0].key = "".to_string();
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyApiKey("bi".to_string()))
        );

        let mut config = base.clone();
        config.currency.rates.insert("GBP".to_string(), 0.0);
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRate("GBP".to_string()))
        );

        let mut config = base;
        config.currency.reporting = String::new();
        assert_eq!(
            config.validate(),
            Err(ValidationError::EmptyReportingCurrency)
        );
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid URL
        assert!(
            serde_yaml::from_str::<RemoteConfig>(r#"{base_url: "not-a-url", api_key: k}"#).is_err()
        );

        // Unknown report in endpoint overrides
        assert!(
            serde_yaml::from_str::<HashMap<ReportKind, EndpointConfig>>(
                r#"{unknown_report: {require_admin: true}}"#
            )
            .is_err()
        );

        // Unknown range policy
        assert!(serde_yaml::from_str::<RangePolicy>("sometimes").is_err());

        // Missing required field
        assert!(
            serde_yaml::from_str::<Config>(
                r#"
listener: {host: "0.0.0.0", port: 8069}
"#
            )
            .is_err()
        );
    }
}
