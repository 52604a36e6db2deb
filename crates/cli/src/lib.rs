pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use trekdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use trekdesk_core::{CurrencyCode, DurationRange, Language, SortOrder};

#[derive(Debug, Parser)]
#[command(
    name = "trekdesk",
    about = "Trekdesk booking operator CLI",
    long_about = "Quote, look up and book Himalayan trek packages against the booking backend.",
    after_help = "Examples:\n  trekdesk quote --price 15000 --travelers 2\n  trekdesk packages --category trek --sort price_asc\n  trekdesk book kedarnath-yatra --name \"Asha Rawat\" --email asha@example.in \\\n    --phone \"+91 98100 12345\" --date 2026-05-10 --travelers 2 --coupon YATRA10\n  trekdesk smoke"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default trekdesk.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override api.base_url")]
    pub api_url: Option<String>,
    #[arg(
        long,
        global = true,
        value_name = "CODE",
        help = "Display currency (INR|USD|EUR|GBP|NPR)"
    )]
    pub currency: Option<CurrencyCode>,
    #[arg(long, global = true, value_name = "TAG", help = "Display language (en|hi)")]
    pub language: Option<Language>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                api_base_url: self.api_url.clone(),
                display_currency: self.currency,
                language: self.language,
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute a price quote offline and render it in every currency")]
    Quote(QuoteArgs),
    #[command(about = "List packages with filters, sorting and pagination")]
    Packages(PackagesArgs),
    #[command(about = "Show one package by id or slug")]
    Package {
        #[arg(value_name = "ID")]
        id: String,
    },
    #[command(about = "Ask the offer service what a coupon is worth for a party size")]
    Coupon(CouponArgs),
    #[command(about = "Create a booking and its payment order")]
    Book(BookArgs),
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Run configuration and backend readiness checks with per-check timing")]
    Smoke,
}

#[derive(Clone, Debug, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Per-traveler price in the home currency")]
    pub price: Decimal,
    #[arg(long, default_value_t = 1)]
    pub travelers: u32,
    #[arg(long, default_value_t = Decimal::ZERO, help = "Validated discount amount")]
    pub discount: Decimal,
}

#[derive(Clone, Debug, Default, Args)]
pub struct PackagesArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub price_min: Option<Decimal>,
    #[arg(long)]
    pub price_max: Option<Decimal>,
    #[arg(long, value_name = "1-3|4-7|8-14|15+")]
    pub duration: Option<DurationRange>,
    #[arg(long, value_name = "featured|price_asc|price_desc|rating|duration")]
    pub sort: Option<SortOrder>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, Args)]
pub struct CouponArgs {
    #[arg(value_name = "PACKAGE_ID")]
    pub package: String,
    #[arg(long)]
    pub code: String,
    #[arg(long, default_value_t = 1)]
    pub travelers: u32,
}

#[derive(Clone, Debug, Args)]
pub struct BookArgs {
    #[arg(value_name = "PACKAGE_ID")]
    pub package: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: NaiveDate,
    #[arg(long, default_value_t = 1)]
    pub travelers: u32,
    #[arg(long)]
    pub coupon: Option<String>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("logging disabled: {error:#}");
        }
    }

    let result = match cli.command {
        Command::Quote(args) => commands::quote::run(&options, &args),
        Command::Packages(args) => commands::catalog::list(&options, &args),
        Command::Package { id } => commands::catalog::show(&options, &id),
        Command::Coupon(args) => commands::coupon::run(&options, &args),
        Command::Book(args) => commands::book::run(&options, &args),
        Command::Config => commands::config::run(&options),
        Command::Smoke => commands::smoke::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only command payloads.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow::anyhow!(error)).context("installing tracing subscriber")
}
