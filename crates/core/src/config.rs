use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::currency::{CurrencyCode, CurrencyError, ExchangeRates};
use crate::preferences::{DisplayPreferences, Language};

pub const DEFAULT_CONFIG_FILE: &str = "trekdesk.toml";
pub const MAX_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub currency: CurrencyConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub auth_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct CurrencyConfig {
    /// Currency prices are stored and charged in.
    pub home: CurrencyCode,
    /// Currency amounts are shown in by default.
    pub display: CurrencyCode,
    /// Home-to-target rates; empty means the built-in INR table.
    pub rates: BTreeMap<CurrencyCode, Decimal>,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub language: Language,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub api_timeout_secs: Option<u64>,
    pub api_auth_token: Option<String>,
    pub display_currency: Option<CurrencyCode>,
    pub language: Option<Language>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid currency configuration: {0}")]
    Currency(#[from] CurrencyError),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:4000/api".to_string(),
                timeout_secs: 20,
                auth_token: None,
            },
            currency: CurrencyConfig {
                home: CurrencyCode::Inr,
                display: CurrencyCode::Inr,
                rates: BTreeMap::new(),
            },
            display: DisplayConfig { language: Language::En },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Rates used by every formatter built from this configuration.
    pub fn exchange_rates(&self) -> Result<ExchangeRates, ConfigError> {
        if self.currency.rates.is_empty() && self.currency.home == CurrencyCode::Inr {
            return Ok(ExchangeRates::default());
        }
        let mut rates = ExchangeRates::default_rates();
        if self.currency.home != CurrencyCode::Inr {
            rates.clear();
        }
        rates.extend(self.currency.rates.iter().map(|(code, rate)| (*code, *rate)));
        Ok(ExchangeRates::new(self.currency.home, rates)?)
    }

    pub fn display_preferences(&self) -> DisplayPreferences {
        DisplayPreferences::new(self.display.language, self.currency.display)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(auth_token) = api.auth_token.filter(|value| !value.trim().is_empty()) {
                self.api.auth_token = Some(secret_value(auth_token));
            }
        }

        if let Some(currency) = patch.currency {
            if let Some(home) = currency.home {
                self.currency.home = home;
            }
            if let Some(display) = currency.display {
                self.currency.display = display;
            }
            if let Some(rates) = currency.rates {
                self.currency.rates.extend(rates);
            }
        }

        if let Some(display) = patch.display {
            if let Some(language) = display.language {
                self.display.language = language;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TREKDESK_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("TREKDESK_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("TREKDESK_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TREKDESK_API_AUTH_TOKEN") {
            self.api.auth_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("TREKDESK_CURRENCY_HOME") {
            self.currency.home = parse_currency("TREKDESK_CURRENCY_HOME", &value)?;
        }
        if let Some(value) = read_env("TREKDESK_CURRENCY_DISPLAY") {
            self.currency.display = parse_currency("TREKDESK_CURRENCY_DISPLAY", &value)?;
        }
        for code in CurrencyCode::ALL {
            let key = format!("TREKDESK_CURRENCY_RATE_{}", code.code());
            if let Some(value) = read_env(&key) {
                let rate = value
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| ConfigError::InvalidEnvOverride { key: key.clone(), value })?;
                self.currency.rates.insert(code, rate);
            }
        }

        if let Some(value) = read_env("TREKDESK_DISPLAY_LANGUAGE") {
            self.display.language =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "TREKDESK_DISPLAY_LANGUAGE".to_string(),
                    value: value.clone(),
                })?;
        }

        let log_level =
            read_env("TREKDESK_LOGGING_LEVEL").or_else(|| read_env("TREKDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TREKDESK_LOGGING_FORMAT").or_else(|| read_env("TREKDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.api_base_url {
            self.api.base_url = base_url;
        }
        if let Some(timeout_secs) = overrides.api_timeout_secs {
            self.api.timeout_secs = timeout_secs;
        }
        if let Some(auth_token) = overrides.api_auth_token {
            self.api.auth_token = Some(secret_value(auth_token));
        }
        if let Some(display_currency) = overrides.display_currency {
            self.currency.display = display_currency;
        }
        if let Some(language) = overrides.language {
            self.display.language = language;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        self.exchange_rates()?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    let has_scheme = base_url.starts_with("http://") || base_url.starts_with("https://");
    let has_host = base_url.split_once("://").is_some_and(|(_, rest)| !rest.trim().is_empty());
    if !has_scheme || !has_host {
        return Err(ConfigError::Validation(
            "api.base_url must be an http:// or https:// URL with a host".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "api.timeout_secs must be in range 1..={MAX_TIMEOUT_SECS}"
        )));
    }

    let blank_token =
        api.auth_token.as_ref().is_some_and(|token| token.expose_secret().trim().is_empty());
    if blank_token {
        return Err(ConfigError::Validation(
            "api.auth_token must not be blank when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_currency(key: &str, value: &str) -> Result<CurrencyCode, ConfigError> {
    value.parse::<CurrencyCode>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    currency: Option<CurrencyPatch>,
    display: Option<DisplayPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CurrencyPatch {
    home: Option<CurrencyCode>,
    display: Option<CurrencyCode>,
    rates: Option<BTreeMap<CurrencyCode, Decimal>>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayPatch {
    language: Option<Language>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
