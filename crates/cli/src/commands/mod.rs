pub mod book;
pub mod catalog;
pub mod config;
pub mod coupon;
pub mod quote;
pub mod smoke;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use trekdesk_client::ApiClient;
use trekdesk_core::config::{AppConfig, LoadOptions};
use trekdesk_core::errors::ApiError;
use trekdesk_core::CurrencyFormatter;

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_VALIDATION: u8 = 3;
pub const EXIT_NOT_FOUND: u8 = 4;
pub const EXIT_REMOTE: u8 = 5;
pub const EXIT_SMOKE: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, None)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: EXIT_OK, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_with(command, error_class, message, exit_code, None)
    }

    pub fn failure_with(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a backend failure onto the CLI exit-code contract.
    pub fn api_failure(command: &str, error: &ApiError) -> Self {
        let exit_code = match error {
            ApiError::NotFound { .. } => EXIT_NOT_FOUND,
            ApiError::InvalidCoupon { .. } => EXIT_VALIDATION,
            _ => EXIT_REMOTE,
        };
        Self::failure(command, error.class(), error.user_message(), exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(
    command: &str,
    options: &LoadOptions,
) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn api_client(command: &str, config: &AppConfig) -> Result<ApiClient, CommandResult> {
    ApiClient::new(&config.api).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

pub(crate) fn currency_formatter(
    command: &str,
    config: &AppConfig,
) -> Result<CurrencyFormatter, CommandResult> {
    config.exchange_rates().map(CurrencyFormatter::new).map_err(|error| {
        CommandResult::failure(command, "config_validation", error.to_string(), EXIT_CONFIG)
    })
}

/// Runs one command body on a single-threaded runtime; commands are one-shot.
pub(crate) fn block_on<F>(command: &str, future: F) -> CommandResult
where
    F: Future<Output = Result<CommandResult, CommandResult>>,
{
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future).unwrap_or_else(|failure| failure),
        Err(error) => CommandResult::failure(
            command,
            "runtime",
            format!("failed to initialize async runtime: {error}"),
            EXIT_REMOTE,
        ),
    }
}
