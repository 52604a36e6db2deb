use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use trekdesk_client::ApiClient;
use trekdesk_core::config::{AppConfig, LoadOptions};
use trekdesk_core::{CurrencyCode, CurrencyFormatter};

use crate::commands::{CommandResult, EXIT_OK, EXIT_SMOKE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(options.clone())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("currency_formatting"));
            checks.push(skipped("backend_reachability"));
            return finalize_report(checks, elapsed_since(started));
        }
    };

    checks.push(check_currency_formatting(&config));

    let client = match ApiClient::new(&config.api) {
        Ok(client) => client,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "backend_reachability",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: error.to_string(),
            });
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "backend_reachability",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            return finalize_report(checks, elapsed_since(started));
        }
    };

    let ping_started = Instant::now();
    let ping = runtime.block_on(client.ping());
    let elapsed_ms = elapsed_since(ping_started);
    checks.push(match ping {
        Ok(pagination) => SmokeCheck {
            name: "backend_reachability",
            status: SmokeStatus::Pass,
            elapsed_ms,
            message: format!(
                "`{}` answered with {} packages",
                client.base_url(),
                pagination.total_items
            ),
        },
        Err(error) => SmokeCheck {
            name: "backend_reachability",
            status: SmokeStatus::Fail,
            elapsed_ms,
            message: format!("`{}` is not usable: {error}", client.base_url()),
        },
    });

    finalize_report(checks, elapsed_since(started))
}

/// Every supported currency must render a non-empty amount with the configured rates.
fn check_currency_formatting(config: &AppConfig) -> SmokeCheck {
    let started = Instant::now();
    let formatted = config
        .exchange_rates()
        .map(|rates| CurrencyFormatter::new(rates).format_all(Decimal::new(123_456_789, 2)));

    let (status, message) = match formatted {
        Ok(amounts) => {
            let rendered = amounts.values().filter(|amount| !amount.is_empty()).count();
            if rendered == CurrencyCode::ALL.len() {
                let home = amounts.get(&config.currency.home).cloned().unwrap_or_default();
                (SmokeStatus::Pass, format!("{rendered} currencies render, home sample {home}"))
            } else {
                (SmokeStatus::Fail, format!("only {rendered} currencies rendered"))
            }
        }
        Err(error) => (SmokeStatus::Fail, error.to_string()),
    };

    SmokeCheck {
        name: "currency_formatting",
        status,
        elapsed_ms: elapsed_since(started),
        message,
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped after an earlier failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult {
        exit_code: if failed { EXIT_SMOKE } else { EXIT_OK },
        output: format!("{human}\n{machine}"),
    }
}
