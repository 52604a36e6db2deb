use rust_decimal::Decimal;
use serde_json::json;
use trekdesk_core::config::LoadOptions;
use trekdesk_core::{
    compute_quote, CatalogApi, CouponValidator, DomainError, PackageId, MAX_TRAVELERS,
};

use crate::commands::{
    api_client, block_on, currency_formatter, load_config, CommandResult, EXIT_VALIDATION,
};
use crate::CouponArgs;

pub fn run(options: &LoadOptions, args: &CouponArgs) -> CommandResult {
    if !(1..=MAX_TRAVELERS).contains(&args.travelers) {
        let error = DomainError::InvalidTravelerCount { count: args.travelers, max: MAX_TRAVELERS };
        return validation_failure(&error);
    }

    block_on("coupon", check_coupon(options, args))
}

async fn check_coupon(
    options: &LoadOptions,
    args: &CouponArgs,
) -> Result<CommandResult, CommandResult> {
    let config = load_config("coupon", options)?;
    let formatter = currency_formatter("coupon", &config)?;
    let api = api_client("coupon", &config)?;

    let package = api
        .get_package(&PackageId(args.package.trim().to_string()))
        .await
        .map_err(|error| CommandResult::api_failure("coupon", &error))?;

    // The offer service prices the whole party, so it is asked about the subtotal.
    let subtotal = compute_quote(package.price, args.travelers, Decimal::ZERO)
        .map_err(|error| validation_failure(&error))?
        .subtotal;
    let discount = CouponValidator::new(&api)
        .validate(&args.code, &package.id, subtotal)
        .await
        .map_err(|error| CommandResult::api_failure("coupon", &error))?;

    let quote = compute_quote(package.price, args.travelers, discount)
        .map_err(|error| validation_failure(&error))?;
    let display = quote.display(&formatter, config.currency.display);
    let message = format!("{} off, total {}", display.discount, display.total);

    Ok(CommandResult::success_with(
        "coupon",
        message,
        Some(json!({
            "package_id": package.id,
            "code": args.code.trim().to_ascii_uppercase(),
            "quote": quote,
            "display": display,
        })),
    ))
}

fn validation_failure(error: &DomainError) -> CommandResult {
    CommandResult::failure("coupon", "validation", error.user_message(), EXIT_VALIDATION)
}
