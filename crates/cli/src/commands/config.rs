use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use toml::Value;
use trekdesk_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use trekdesk_core::CurrencyCode;

use crate::commands::{load_config, CommandResult, EXIT_OK};

struct Field<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'a [&'a str],
    flag: Option<&'static str>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let flags = &options.overrides;

    let rate_env_keys: Vec<String> = CurrencyCode::ALL
        .iter()
        .map(|code| format!("TREKDESK_CURRENCY_RATE_{}", code.code()))
        .collect();
    let rate_env_refs: Vec<&str> = rate_env_keys.iter().map(String::as_str).collect();

    let fields = [
        Field {
            key_path: "api.base_url",
            value: config.api.base_url.clone(),
            env_keys: &["TREKDESK_API_BASE_URL"],
            flag: flags.api_base_url.as_ref().map(|_| "--api-url"),
        },
        Field {
            key_path: "api.timeout_secs",
            value: config.api.timeout_secs.to_string(),
            env_keys: &["TREKDESK_API_TIMEOUT_SECS"],
            flag: flags.api_timeout_secs.map(|_| "override"),
        },
        Field {
            key_path: "api.auth_token",
            value: redact_token(&config),
            env_keys: &["TREKDESK_API_AUTH_TOKEN"],
            flag: flags.api_auth_token.as_ref().map(|_| "override"),
        },
        Field {
            key_path: "currency.home",
            value: config.currency.home.to_string(),
            env_keys: &["TREKDESK_CURRENCY_HOME"],
            flag: None,
        },
        Field {
            key_path: "currency.display",
            value: config.currency.display.to_string(),
            env_keys: &["TREKDESK_CURRENCY_DISPLAY"],
            flag: flags.display_currency.map(|_| "--currency"),
        },
        Field {
            key_path: "currency.rates",
            value: render_rates(&config),
            env_keys: &rate_env_refs,
            flag: None,
        },
        Field {
            key_path: "display.language",
            value: config.display.language.to_string(),
            env_keys: &["TREKDESK_DISPLAY_LANGUAGE"],
            flag: flags.language.map(|_| "--language"),
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["TREKDESK_LOGGING_LEVEL", "TREKDESK_LOG_LEVEL"],
            flag: flags.log_level.as_ref().map(|_| "--log-level"),
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            env_keys: &["TREKDESK_LOGGING_FORMAT", "TREKDESK_LOG_FORMAT"],
            flag: None,
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: EXIT_OK, output: lines.join("\n") }
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field<'_>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag) = field.flag {
        return format!("flag ({flag})");
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn render_rates(config: &AppConfig) -> String {
    match config.exchange_rates() {
        Ok(rates) => CurrencyCode::ALL
            .iter()
            .filter(|code| **code != rates.home())
            .filter_map(|code| rates.rate(*code).map(|rate| format!("{code}={rate}")))
            .collect::<Vec<_>>()
            .join(", "),
        Err(error) => format!("<invalid: {error}>"),
    }
}

/// Shows only that a token is configured and how long it is.
fn redact_token(config: &AppConfig) -> String {
    match &config.api.auth_token {
        Some(token) => {
            let token = token.expose_secret().trim();
            if token.is_empty() {
                "<empty>".to_string()
            } else {
                format!("<redacted, {} chars>", token.chars().count())
            }
        }
        None => "<unset>".to_string(),
    }
}
