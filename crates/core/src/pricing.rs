use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{CurrencyCode, CurrencyFormatter};
use crate::errors::DomainError;

/// Largest per-traveler price accepted for a quote, in home-currency units.
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

/// What the customer will be charged for one package, party size and coupon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub unit_price: Decimal,
    pub traveler_count: u32,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuoteDisplay {
    pub currency: CurrencyCode,
    pub unit_price: String,
    pub subtotal: String,
    pub discount: String,
    pub total: String,
}

/// `subtotal = unit_price * traveler_count`, `total = max(0, subtotal - discount)`.
///
/// Negative discounts count as zero and the recorded discount never exceeds the subtotal.
/// Unit prices outside `0..=MAX_UNIT_PRICE` are refused.
pub fn compute_quote(
    unit_price: Decimal,
    traveler_count: u32,
    discount: Decimal,
) -> Result<PriceQuote, DomainError> {
    let unit_price = check_unit_price(unit_price)?;
    Ok(quote_in_range(unit_price, traveler_count, discount))
}

/// `unit_price` must already have passed `check_unit_price`. At most
/// `MAX_UNIT_PRICE * u32::MAX` (about 4.3e18), which a `Decimal` holds exactly.
pub(crate) fn quote_in_range(
    unit_price: Decimal,
    traveler_count: u32,
    discount: Decimal,
) -> PriceQuote {
    let subtotal = unit_price * Decimal::from(traveler_count);
    let discount = discount.max(Decimal::ZERO).min(subtotal);
    let total = (subtotal - discount).max(Decimal::ZERO);

    PriceQuote { unit_price, traveler_count, subtotal, discount, total }
}

pub fn check_unit_price(price: Decimal) -> Result<Decimal, DomainError> {
    let max = Decimal::from(MAX_UNIT_PRICE);
    if price < Decimal::ZERO || price > max {
        return Err(DomainError::PriceOutOfRange { price, max });
    }
    Ok(price)
}

impl PriceQuote {
    pub fn trace(&self) -> Vec<PricingTraceStep> {
        vec![
            PricingTraceStep {
                stage: "subtotal".to_string(),
                detail: format!("{} x {} travelers", self.unit_price, self.traveler_count),
                amount: self.subtotal,
            },
            PricingTraceStep {
                stage: "discount".to_string(),
                detail: "validated coupon, capped at subtotal".to_string(),
                amount: self.discount,
            },
            PricingTraceStep {
                stage: "total".to_string(),
                detail: "max(0, subtotal - discount)".to_string(),
                amount: self.total,
            },
        ]
    }

    /// Renders home-currency amounts in `currency`.
    pub fn display(&self, formatter: &CurrencyFormatter, currency: CurrencyCode) -> QuoteDisplay {
        QuoteDisplay {
            currency,
            unit_price: formatter.format_converted(self.unit_price, currency),
            subtotal: formatter.format_converted(self.subtotal, currency),
            discount: formatter.format_converted(self.discount, currency),
            total: formatter.format_converted(self.total, currency),
        }
    }
}
