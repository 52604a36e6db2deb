use chrono::{Local, NaiveDate};
use serde_json::json;
use trekdesk_core::config::LoadOptions;
use trekdesk_core::errors::ApiError;
use trekdesk_core::{
    BookingForm, CatalogApi, CheckoutError, CouponPhase, CustomerDetails, DomainError, PackageId,
};

use crate::commands::{
    api_client, block_on, currency_formatter, load_config, CommandResult, EXIT_NOT_FOUND,
    EXIT_REMOTE, EXIT_VALIDATION,
};
use crate::BookArgs;

pub fn run(options: &LoadOptions, args: &BookArgs) -> CommandResult {
    block_on("book", book(options, args))
}

async fn book(options: &LoadOptions, args: &BookArgs) -> Result<CommandResult, CommandResult> {
    let config = load_config("book", options)?;
    let formatter = currency_formatter("book", &config)?;
    let api = api_client("book", &config)?;
    let today = Local::now().date_naive();

    let package = api
        .get_package(&PackageId(args.package.trim().to_string()))
        .await
        .map_err(|error| CommandResult::api_failure("book", &error))?;

    let mut form = BookingForm::new(&package, config.currency.home, config.display.language)
        .map_err(|error| domain_failure(&error))?;
    fill_form(&mut form, args, today).map_err(|error| domain_failure(&error))?;

    let mut coupon_note = None;
    if let Some(code) = args.coupon.as_deref() {
        form.set_coupon_code(code).map_err(|error| domain_failure(&error))?;
        let state = form.apply_coupon(&api).await.map_err(|error| domain_failure(&error))?;
        // A refused coupon leaves the booking payable at full price.
        if state.phase() == CouponPhase::Rejected {
            coupon_note = state.error_message().map(str::to_string);
        }
    }

    let display = form.quote().display(&formatter, config.currency.display);
    match form.submit(&api, today).await {
        Ok(confirmation) => {
            let message = format!(
                "booking {} created for {}, payment order {}",
                confirmation.booking_id,
                display.total,
                confirmation.payment_order.order_id().unwrap_or("pending")
            );
            Ok(CommandResult::success_with(
                "book",
                message,
                Some(json!({
                    "booking_id": confirmation.booking_id,
                    "request": confirmation.request,
                    "payment_order": confirmation.payment_order,
                    "display": display,
                    "coupon_note": coupon_note,
                })),
            ))
        }
        Err(error) => Err(checkout_failure(&error)),
    }
}

fn fill_form(form: &mut BookingForm, args: &BookArgs, today: NaiveDate) -> Result<(), DomainError> {
    form.set_customer(CustomerDetails::new(&args.name, &args.email, &args.phone))?;
    form.set_travel_date(args.date)?;
    form.set_traveler_count(args.travelers)?;
    form.validate(today)
}

fn domain_failure(error: &DomainError) -> CommandResult {
    let data = match error {
        DomainError::Validation(fields) => Some(json!({ "fields": fields })),
        _ => None,
    };
    CommandResult::failure_with("book", "validation", error.user_message(), EXIT_VALIDATION, data)
}

fn checkout_failure(error: &CheckoutError) -> CommandResult {
    match error {
        CheckoutError::Domain(domain) => domain_failure(domain),
        CheckoutError::BookingFailed(api) => CommandResult::api_failure("book", api),
        CheckoutError::PaymentOrderFailed { booking_id, source } => CommandResult::failure_with(
            "book",
            "payment_order_failed",
            error.user_message(),
            remote_exit_code(source),
            Some(json!({ "booking_id": booking_id, "cause": source.class() })),
        ),
        CheckoutError::AlreadyConfirmed { booking_id } => CommandResult::failure_with(
            "book",
            "already_confirmed",
            error.user_message(),
            EXIT_VALIDATION,
            Some(json!({ "booking_id": booking_id })),
        ),
    }
}

fn remote_exit_code(error: &ApiError) -> u8 {
    match error {
        ApiError::NotFound { .. } => EXIT_NOT_FOUND,
        _ => EXIT_REMOTE,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use trekdesk_core::errors::ApiError;
    use trekdesk_core::{BookingId, CheckoutError, DomainError, FieldError};

    use super::{checkout_failure, domain_failure};
    use crate::commands::{EXIT_REMOTE, EXIT_VALIDATION};

    fn payload(output: &str) -> Value {
        serde_json::from_str(output).expect("command output should be valid JSON")
    }

    #[test]
    fn payment_failure_keeps_booking_id_in_payload() {
        let error = CheckoutError::PaymentOrderFailed {
            booking_id: BookingId("bk_123".to_string()),
            source: ApiError::ServiceUnavailable { status: 502 },
        };

        let result = checkout_failure(&error);
        let value = payload(&result.output);

        assert_eq!(result.exit_code, EXIT_REMOTE);
        assert_eq!(value["error_class"], "payment_order_failed");
        assert_eq!(value["data"]["booking_id"], "bk_123");
        assert_eq!(value["data"]["cause"], "service_unavailable");
        assert!(value["message"].as_str().unwrap_or_default().contains("bk_123"));
    }

    #[test]
    fn field_errors_are_listed_for_validation_failures() {
        let error = DomainError::Validation(vec![
            FieldError::new("customer_email", "Please enter a valid email address."),
            FieldError::new("travel_date", "Please choose a travel date."),
        ]);

        let result = domain_failure(&error);
        let value = payload(&result.output);

        assert_eq!(result.exit_code, EXIT_VALIDATION);
        assert_eq!(value["data"]["fields"][0]["field"], "customer_email");
        assert_eq!(value["data"]["fields"][1]["field"], "travel_date");
    }
}
