use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use rust_decimal::Decimal;
use serde_json::Value;
use trekdesk_cli::commands::{book, catalog, config, coupon, quote, smoke};
use trekdesk_cli::{BookArgs, CouponArgs, PackagesArgs, QuoteArgs};
use trekdesk_core::config::{ConfigOverrides, LoadOptions};

const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";
const UNREACHABLE_ENV: [(&str, &str); 2] =
    [("TREKDESK_API_BASE_URL", UNREACHABLE_API), ("TREKDESK_API_TIMEOUT_SECS", "2")];

#[test]
fn quote_renders_totals_in_every_currency() {
    with_env(&[], || {
        let args = QuoteArgs {
            price: Decimal::new(15_000, 0),
            travelers: 2,
            discount: Decimal::new(3_000, 0),
        };

        let result = quote::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "expected successful quote");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["display"]["subtotal"], "₹30,000");
        assert_eq!(payload["data"]["display"]["total"], "₹27,000");
        assert_eq!(payload["data"]["total_in_all_currencies"]["INR"], "₹27,000");
        assert!(payload["data"]["total_in_all_currencies"]["USD"]
            .as_str()
            .is_some_and(|usd| usd.starts_with('$')));
    });
}

#[test]
fn quote_uses_display_currency_from_env() {
    let vars = [("TREKDESK_CURRENCY_DISPLAY", "usd"), ("TREKDESK_CURRENCY_RATE_USD", "0.01")];
    with_env(&vars, || {
        let args =
            QuoteArgs { price: Decimal::new(15_000, 0), travelers: 1, discount: Decimal::ZERO };

        let result = quote::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["display"]["currency"], "USD");
        assert_eq!(payload["data"]["display"]["total"], "$150.00");
    });
}

#[test]
fn quote_rejects_out_of_range_party_size() {
    with_env(&[], || {
        let args =
            QuoteArgs { price: Decimal::new(9_000, 0), travelers: 0, discount: Decimal::ZERO };

        let result = quote::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 3, "expected validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "validation");
    });
}

#[test]
fn quote_refuses_price_beyond_supported_range() {
    with_env(&[], || {
        let args = QuoteArgs { price: Decimal::MAX, travelers: 2, discount: Decimal::ZERO };

        let result = quote::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 3, "expected validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "validation");
        assert!(payload["message"].as_str().unwrap_or_default().contains("contact us"));
    });
}

#[test]
fn invalid_config_returns_config_failure() {
    with_env(&[("TREKDESK_API_TIMEOUT_SECS", "0")], || {
        let args =
            QuoteArgs { price: Decimal::new(9_000, 0), travelers: 1, discount: Decimal::ZERO };

        let result = quote::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn packages_against_unreachable_backend_is_remote_failure() {
    with_env(&UNREACHABLE_ENV, || {
        let result = catalog::list(&LoadOptions::default(), &PackagesArgs::default());
        assert_eq!(result.exit_code, 5, "expected remote failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "packages");
        assert_eq!(payload["status"], "error");
        assert!(payload["message"].as_str().unwrap_or_default().contains("try again"));
    });
}

#[test]
fn coupon_rejects_party_size_before_any_call() {
    with_env(&[("TREKDESK_API_BASE_URL", UNREACHABLE_API)], || {
        let args = CouponArgs {
            package: "kedarnath-yatra".to_string(),
            code: "YATRA10".to_string(),
            travelers: 51,
        };

        let result = coupon::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "validation");
    });
}

#[test]
fn book_reports_remote_failure_when_package_lookup_fails() {
    with_env(&UNREACHABLE_ENV, || {
        let args = BookArgs {
            package: "kedarnath-yatra".to_string(),
            name: "Asha Rawat".to_string(),
            email: "asha@example.in".to_string(),
            phone: "+91 98100 12345".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2030, 5, 10).expect("valid date"),
            travelers: 2,
            coupon: None,
        };

        let result = book::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 5);
        assert_eq!(parse_payload(&result.output)["command"], "book");
    });
}

#[test]
fn config_attributes_sources_and_redacts_token() {
    with_env(
        &[
            ("TREKDESK_API_BASE_URL", "https://bookings.example.in/api"),
            ("TREKDESK_API_AUTH_TOKEN", "tk_live_0123456789"),
        ],
        || {
            let options = LoadOptions {
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            };

            let result = config::run(&options);
            assert_eq!(result.exit_code, 0);

            let output = &result.output;
            assert!(output.contains(
                "- api.base_url = https://bookings.example.in/api (source: env (TREKDESK_API_BASE_URL))"
            ));
            assert!(output.contains("- logging.level = debug (source: flag (--log-level))"));
            assert!(output.contains("- api.timeout_secs = 20 (source: default)"));
            assert!(output.contains("<redacted, 18 chars>"));
            assert!(!output.contains("tk_live_0123456789"));
        },
    );
}

#[test]
fn config_reports_file_sources() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trekdesk.toml");
        fs::write(&path, "[currency]\ndisplay = \"EUR\"\n\n[display]\nlanguage = \"hi\"\n")
            .expect("write config");

        let options = LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        };

        let result = config::run(&options);
        assert_eq!(result.exit_code, 0);

        let file_source = format!("(source: file ({}))", path.display());
        assert!(result.output.contains(&format!("- currency.display = EUR {file_source}")));
        assert!(result.output.contains(&format!("- display.language = hi {file_source}")));
        assert!(result.output.contains("- currency.home = INR (source: default)"));
    });
}

#[test]
fn smoke_returns_failure_report_when_backend_unreachable() {
    with_env(&UNREACHABLE_ENV, || {
        let result = smoke::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "pass");
        assert_eq!(payload["checks"][1]["name"], "currency_formatting");
        assert_eq!(payload["checks"][1]["status"], "pass");
        assert_eq!(payload["checks"][2]["name"], "backend_reachability");
        assert_eq!(payload["checks"][2]["status"], "fail");
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("TREKDESK_CURRENCY_HOME", "USD")], || {
        let result = smoke::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TREKDESK_API_BASE_URL",
        "TREKDESK_API_TIMEOUT_SECS",
        "TREKDESK_API_AUTH_TOKEN",
        "TREKDESK_CURRENCY_HOME",
        "TREKDESK_CURRENCY_DISPLAY",
        "TREKDESK_CURRENCY_RATE_INR",
        "TREKDESK_CURRENCY_RATE_USD",
        "TREKDESK_CURRENCY_RATE_EUR",
        "TREKDESK_CURRENCY_RATE_GBP",
        "TREKDESK_CURRENCY_RATE_NPR",
        "TREKDESK_DISPLAY_LANGUAGE",
        "TREKDESK_LOGGING_LEVEL",
        "TREKDESK_LOGGING_FORMAT",
        "TREKDESK_LOG_LEVEL",
        "TREKDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}
