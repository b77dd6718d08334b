use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub agendor: AgendorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Upstream CRM connection
#[derive(Debug, Deserialize, Clone)]
pub struct AgendorConfig {
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub api_token: String,
    /// Prefix of the Authorization header value
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Business constants of the sales funnel dashboard
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Funnel whose deals always enter the overview bar chart
    pub core_funnel: String,
    /// Description substring that also makes a deal eligible for the overview
    pub description_marker: String,
    /// Width of the initial date-range filter, ending today
    pub default_range_days: i64,
    /// Leads trend covers the last N days
    pub leads_lookback_days: i64,
    /// Stage names left out of the category selector
    #[serde(default)]
    pub hidden_categories: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            core_funnel: "AMBULANTE ESSENCIAL".to_string(),
            description_marker: "CA".to_string(),
            default_range_days: 60,
            leads_lookback_days: 30,
            hidden_categories: vec!["AMBULANTE ESSENCIAL".to_string()],
        }
    }
}

fn default_page_size() -> u32 {
    100
}

fn default_auth_scheme() -> String {
    "Token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[agendor]
base_url = "https://api.agendor.com.br/v3/deals"
page_size = 100
api_token = ""
auth_scheme = "Token"
timeout_secs = 30

[retry]
max_attempts = 3
initial_backoff_ms = 250
max_backoff_ms = 2000

[server]
port = 3000

[dashboard]
core_funnel = "AMBULANTE ESSENCIAL"
description_marker = "CA"
default_range_days = 60
leads_lookback_days = 30
hidden_categories = ["AMBULANTE ESSENCIAL"]
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// `AGENDOR_API_TOKEN` and `PORT` from the environment override the file.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_env_overrides(
        &mut config,
        std::env::var("AGENDOR_API_TOKEN").ok(),
        std::env::var("PORT").ok(),
    )?;
    validate(&config)?;
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return Ok(toml::from_str(&contents)?);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    Ok(toml::from_str(DEFAULT_CONFIG)?)
}

fn apply_env_overrides(
    config: &mut Config,
    api_token: Option<String>,
    port: Option<String>,
) -> anyhow::Result<()> {
    if let Some(token) = api_token.filter(|t| !t.trim().is_empty()) {
        config.agendor.api_token = token;
    }
    if let Some(port) = port {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number, got '{}': {}", port, e))?;
    }
    Ok(())
}

/// Upper bound for day-count settings; keeps date arithmetic far from chrono's limits
const MAX_DAYS: i64 = 36_500;

fn validate(config: &Config) -> anyhow::Result<()> {
    if config.agendor.api_token.trim().is_empty() {
        anyhow::bail!("Agendor API token is not configured (set AGENDOR_API_TOKEN)");
    }
    if config.agendor.page_size == 0 {
        anyhow::bail!("agendor.page_size must be positive");
    }
    for (name, days) in [
        ("dashboard.default_range_days", config.dashboard.default_range_days),
        ("dashboard.leads_lookback_days", config.dashboard.leads_lookback_days),
    ] {
        if !(0..=MAX_DAYS).contains(&days) {
            anyhow::bail!("{} must be between 0 and {}, got {}", name, MAX_DAYS, days);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        toml::from_str(DEFAULT_CONFIG).unwrap()
    }

    #[test]
    fn test_default_config_loads() {
        let config = default_config();
        assert_eq!(config.agendor.base_url, "https://api.agendor.com.br/v3/deals");
        assert_eq!(config.agendor.page_size, 100);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.dashboard.core_funnel, "AMBULANTE ESSENCIAL");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_optional_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [agendor]
            base_url = "http://localhost/deals"
            "#,
        )
        .unwrap();
        assert_eq!(config.agendor.auth_scheme, "Token");
        assert_eq!(config.dashboard.default_range_days, 60);
        assert_eq!(config.retry.initial_backoff_ms, 250);
    }

    #[test]
    fn test_env_overrides_and_validation() {
        let mut config = default_config();
        assert!(validate(&config).is_err());

        apply_env_overrides(&mut config, Some("secret".to_string()), Some("8050".to_string()))
            .unwrap();
        assert_eq!(config.agendor.api_token, "secret");
        assert_eq!(config.server.port, 8050);
        assert!(validate(&config).is_ok());

        assert!(apply_env_overrides(&mut config, None, Some("web".to_string())).is_err());
    }

    #[test]
    fn test_day_counts_are_bounded() {
        let mut config = default_config();
        config.agendor.api_token = "secret".to_string();

        config.dashboard.leads_lookback_days = 100_000_000_000_000;
        assert!(validate(&config).is_err());

        config.dashboard.leads_lookback_days = 30;
        config.dashboard.default_range_days = -1;
        assert!(validate(&config).is_err());

        config.dashboard.default_range_days = 0;
        assert!(validate(&config).is_ok());
    }
}
