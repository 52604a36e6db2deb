//! Currency codes, display rules and fixed-rate conversion.
//!
//! Rates are presentation configuration only: they are injected at startup and never
//! fetched live. Amounts charged to a customer are always in the home currency.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Inr,
    Usd,
    Eur,
    Gbp,
    Npr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    /// `1,234,567`
    Western,
    /// `12,34,567` (lakh/crore)
    Indian,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatRule {
    pub symbol: &'static str,
    pub decimals: u32,
    pub position: SymbolPosition,
    pub spaced: bool,
    pub grouping: Grouping,
    pub group_separator: char,
    pub decimal_separator: char,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("unsupported currency `{0}` (expected INR|USD|EUR|GBP|NPR)")]
    Unsupported(String),
    #[error("missing exchange rate from {home} to {to}")]
    MissingRate { home: CurrencyCode, to: CurrencyCode },
    #[error("exchange rate from {home} to {to} must be positive, got {rate}")]
    NonPositiveRate { home: CurrencyCode, to: CurrencyCode, rate: Decimal },
}

impl CurrencyCode {
    pub const ALL: [CurrencyCode; 5] = [Self::Inr, Self::Usd, Self::Eur, Self::Gbp, Self::Npr];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Npr => "NPR",
        }
    }

    pub const fn rule(self) -> FormatRule {
        match self {
            Self::Inr => FormatRule {
                symbol: "₹",
                decimals: 0,
                position: SymbolPosition::Prefix,
                spaced: false,
                grouping: Grouping::Indian,
                group_separator: ',',
                decimal_separator: '.',
            },
            Self::Usd => FormatRule {
                symbol: "$",
                decimals: 2,
                position: SymbolPosition::Prefix,
                spaced: false,
                grouping: Grouping::Western,
                group_separator: ',',
                decimal_separator: '.',
            },
            Self::Eur => FormatRule {
                symbol: "€",
                decimals: 2,
                position: SymbolPosition::Suffix,
                spaced: true,
                grouping: Grouping::Western,
                group_separator: '.',
                decimal_separator: ',',
            },
            Self::Gbp => FormatRule {
                symbol: "£",
                decimals: 2,
                position: SymbolPosition::Prefix,
                spaced: false,
                grouping: Grouping::Western,
                group_separator: ',',
                decimal_separator: '.',
            },
            Self::Npr => FormatRule {
                symbol: "Rs",
                decimals: 0,
                position: SymbolPosition::Prefix,
                spaced: true,
                grouping: Grouping::Indian,
                group_separator: ',',
                decimal_separator: '.',
            },
        }
    }

    /// Parses a user or wire supplied code, falling back to `fallback` for anything
    /// unsupported so callers never render an empty or garbled amount.
    pub fn resolve_or(raw: &str, fallback: CurrencyCode) -> CurrencyCode {
        match raw.parse() {
            Ok(code) => code,
            Err(error) => {
                warn!(
                    event_name = "currency.unsupported_code",
                    requested = raw,
                    fallback = fallback.code(),
                    error = %error,
                    "falling back to default currency"
                );
                fallback
            }
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "NPR" => Ok(Self::Npr),
            other => Err(CurrencyError::Unsupported(other.to_string())),
        }
    }
}

/// Fixed conversion factors from the home currency into every other supported currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRates {
    home: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl ExchangeRates {
    pub fn new(
        home: CurrencyCode,
        rates: BTreeMap<CurrencyCode, Decimal>,
    ) -> Result<Self, CurrencyError> {
        let mut checked = BTreeMap::new();
        for to in CurrencyCode::ALL {
            if to == home {
                checked.insert(to, Decimal::ONE);
                continue;
            }
            let rate = *rates.get(&to).ok_or(CurrencyError::MissingRate { home, to })?;
            if rate <= Decimal::ZERO {
                return Err(CurrencyError::NonPositiveRate { home, to, rate });
            }
            checked.insert(to, rate);
        }

        Ok(Self { home, rates: checked })
    }

    pub fn home(&self) -> CurrencyCode {
        self.home
    }

    /// `None` only for a currency the table was never built with.
    pub fn rate(&self, to: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&to).copied()
    }

    /// `None` when the rate is missing or the converted amount does not fit a `Decimal`.
    pub fn convert(&self, amount: Decimal, to: CurrencyCode) -> Option<Decimal> {
        if to == self.home {
            return Some(amount);
        }
        amount.checked_mul(self.rate(to)?)
    }

    /// Rates relative to INR used when no configuration overrides them.
    pub fn default_rates() -> BTreeMap<CurrencyCode, Decimal> {
        BTreeMap::from([
            (CurrencyCode::Usd, Decimal::new(12, 3)),
            (CurrencyCode::Eur, Decimal::new(11, 3)),
            (CurrencyCode::Gbp, Decimal::new(95, 4)),
            (CurrencyCode::Npr, Decimal::new(16, 1)),
        ])
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        let mut rates = Self::default_rates();
        rates.insert(CurrencyCode::Inr, Decimal::ONE);
        Self { home: CurrencyCode::Inr, rates }
    }
}

/// Shown in place of an amount that cannot be converted.
pub const UNAVAILABLE: &str = "n/a";

#[derive(Clone, Debug, Default)]
pub struct CurrencyFormatter {
    rates: ExchangeRates,
}

impl CurrencyFormatter {
    pub fn new(rates: ExchangeRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &ExchangeRates {
        &self.rates
    }

    pub fn format(&self, amount: Decimal, currency: CurrencyCode) -> String {
        format_amount(amount, currency)
    }

    /// Converts a home-currency amount into `currency` and formats the result.
    pub fn format_converted(&self, amount: Decimal, currency: CurrencyCode) -> String {
        match self.rates.convert(amount, currency) {
            Some(converted) => format_amount(converted, currency),
            None => {
                warn!(
                    event_name = "currency.conversion_failed",
                    from = %self.rates.home(),
                    to = %currency,
                    amount = %amount,
                    "amount cannot be converted"
                );
                UNAVAILABLE.to_string()
            }
        }
    }

    /// One display string per supported currency for a home-currency amount.
    pub fn format_all(&self, amount: Decimal) -> BTreeMap<CurrencyCode, String> {
        CurrencyCode::ALL
            .into_iter()
            .map(|currency| (currency, self.format_converted(amount, currency)))
            .collect()
    }
}

pub fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    let rule = currency.rule();
    let rounded =
        amount.round_dp_with_strategy(rule.decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let digits = format!("{:.*}", rule.decimals as usize, rounded.abs());
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut number = group_digits(integer, rule.grouping, rule.group_separator);
    if let Some(fraction) = fraction {
        number.push(rule.decimal_separator);
        number.push_str(fraction);
    }

    let space = if rule.spaced { " " } else { "" };
    let body = match rule.position {
        SymbolPosition::Prefix => format!("{}{space}{number}", rule.symbol),
        SymbolPosition::Suffix => format!("{number}{space}{}", rule.symbol),
    };

    if negative {
        format!("-{body}")
    } else {
        body
    }
}

fn group_digits(digits: &str, grouping: Grouping, separator: char) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let step = match grouping {
        Grouping::Western => 3,
        Grouping::Indian => 2,
    };

    let (mut rest, last) = digits.split_at(digits.len() - 3);
    let mut groups = vec![last];
    while rest.len() > step {
        let (head, tail) = rest.split_at(rest.len() - step);
        groups.push(tail);
        rest = head;
    }
    groups.push(rest);
    groups.reverse();

    groups.join(&separator.to_string())
}
