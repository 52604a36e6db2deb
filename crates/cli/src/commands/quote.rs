use serde_json::json;
use trekdesk_core::config::LoadOptions;
use trekdesk_core::{compute_quote, DomainError, MAX_TRAVELERS};

use crate::commands::{currency_formatter, load_config, CommandResult, EXIT_VALIDATION};
use crate::QuoteArgs;

pub fn run(options: &LoadOptions, args: &QuoteArgs) -> CommandResult {
    let config = match load_config("quote", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    if !(1..=MAX_TRAVELERS).contains(&args.travelers) {
        let error = DomainError::InvalidTravelerCount { count: args.travelers, max: MAX_TRAVELERS };
        return CommandResult::failure("quote", "validation", error.user_message(), EXIT_VALIDATION);
    }

    let formatter = match currency_formatter("quote", &config) {
        Ok(formatter) => formatter,
        Err(failure) => return failure,
    };

    let quote = match compute_quote(args.price, args.travelers, args.discount) {
        Ok(quote) => quote,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "validation",
                error.user_message(),
                EXIT_VALIDATION,
            )
        }
    };
    let display = quote.display(&formatter, config.currency.display);
    let message = format!(
        "{} x {} = {} (total {})",
        display.unit_price, quote.traveler_count, display.subtotal, display.total
    );

    CommandResult::success_with(
        "quote",
        message,
        Some(json!({
            "quote": quote,
            "display": display,
            "trace": quote.trace(),
            "total_in_all_currencies": formatter.format_all(quote.total),
        })),
    )
}
