use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{BookingApi, OfferApi};
use crate::coupon::{normalize_code, CouponValidator};
use crate::currency::CurrencyCode;
use crate::domain::booking::{BookingId, BookingRequest, PaymentOrder, PaymentOrderRequest};
use crate::domain::package::{Package, PackageId};
use crate::errors::{ApiError, DomainError, FieldError};
use crate::flows::{CouponEvent, CouponFlow, CouponRequest, CouponState};
use crate::preferences::Language;
use crate::pricing::{check_unit_price, quote_in_range, PriceQuote};

pub const MAX_TRAVELERS: u32 = 50;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), email: email.into(), phone: phone.into() }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("customer_name", "Enter the lead traveler's name."));
        }
        if !looks_like_email(self.email.trim()) {
            errors.push(FieldError::new("customer_email", "Enter a valid email address."));
        }
        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        let allowed = self
            .phone
            .trim()
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | ' ' | '(' | ')'));
        if !allowed || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            errors.push(FieldError::new("customer_phone", "Enter a valid phone number."));
        }
        errors
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Field checks run before any network call. All failing fields are reported at once.
pub fn validate_details(
    customer: &CustomerDetails,
    travel_date: Option<NaiveDate>,
    traveler_count: u32,
    today: NaiveDate,
) -> Result<(), DomainError> {
    let mut errors = customer.field_errors();
    match travel_date {
        None => errors.push(FieldError::new("travel_date", "Pick a travel date.")),
        Some(date) if date < today => {
            errors.push(FieldError::new("travel_date", "The travel date can't be in the past."))
        }
        Some(_) => {}
    }
    if !(1..=MAX_TRAVELERS).contains(&traveler_count) {
        errors.push(FieldError::new(
            "number_of_travelers",
            format!("Please choose between 1 and {MAX_TRAVELERS} travelers."),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors))
    }
}

/// Where a form is in the booking-then-payment sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Editing,
    /// The booking exists; only the payment order remains. Resubmitting retries that call alone.
    AwaitingPayment { booking_id: BookingId, request: BookingRequest },
    Confirmed { booking_id: BookingId, order_id: Option<String> },
}

impl SubmissionState {
    pub fn booking_id(&self) -> Option<&BookingId> {
        match self {
            Self::Editing => None,
            Self::AwaitingPayment { booking_id, .. } | Self::Confirmed { booking_id, .. } => {
                Some(booking_id)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: BookingId,
    pub request: BookingRequest,
    pub payment_order: PaymentOrder,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("booking `{booking_id}` is already confirmed")]
    AlreadyConfirmed { booking_id: BookingId },
    #[error("booking could not be created: {0}")]
    BookingFailed(#[source] ApiError),
    #[error("booking `{booking_id}` was created but the payment order failed: {source}")]
    PaymentOrderFailed {
        booking_id: BookingId,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Domain(error) => error.user_message(),
            Self::AlreadyConfirmed { booking_id } => {
                format!("Your booking {booking_id} is already confirmed.")
            }
            Self::BookingFailed(error) => error.user_message(),
            Self::PaymentOrderFailed { booking_id, source } => format!(
                "Your booking {booking_id} was created, but we couldn't start the payment. {} \
                 Keep this booking reference if you contact us.",
                source.user_message()
            ),
        }
    }

    /// The booking reference, present whenever the booking itself went through.
    pub fn booking_id(&self) -> Option<&BookingId> {
        match self {
            Self::AlreadyConfirmed { booking_id } | Self::PaymentOrderFailed { booking_id, .. } => {
                Some(booking_id)
            }
            Self::Domain(_) | Self::BookingFailed(_) => None,
        }
    }
}

/// Local state of one booking form: party size, coupon widget, customer fields and
/// the submit sequence. Each form is independent; nothing here is shared.
#[derive(Clone, Debug)]
pub struct BookingForm {
    package_id: PackageId,
    unit_price: Decimal,
    currency: CurrencyCode,
    language: Language,
    customer: CustomerDetails,
    travel_date: Option<NaiveDate>,
    traveler_count: u32,
    coupon_code: String,
    coupon: CouponState,
    next_token: u64,
    flow: CouponFlow,
    submission: SubmissionState,
}

impl BookingForm {
    /// `currency` is what the customer is charged in; prices are stored in it.
    /// Packages priced outside `0..=MAX_UNIT_PRICE` cannot be booked.
    pub fn new(
        package: &Package,
        currency: CurrencyCode,
        language: Language,
    ) -> Result<Self, DomainError> {
        let unit_price = check_unit_price(package.price)?;
        let flow = CouponFlow::new();
        Ok(Self {
            package_id: package.id.clone(),
            unit_price,
            currency,
            language,
            customer: CustomerDetails::default(),
            travel_date: None,
            traveler_count: 1,
            coupon_code: String::new(),
            coupon: flow.initial_state(),
            next_token: 0,
            flow,
            submission: SubmissionState::Editing,
        })
    }

    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    pub fn traveler_count(&self) -> u32 {
        self.traveler_count
    }

    pub fn coupon_code(&self) -> &str {
        &self.coupon_code
    }

    pub fn coupon_state(&self) -> &CouponState {
        &self.coupon
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.travel_date
    }

    pub fn quote(&self) -> PriceQuote {
        quote_in_range(self.unit_price, self.traveler_count, self.coupon.discount())
    }

    pub fn set_customer(&mut self, customer: CustomerDetails) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.customer = customer;
        Ok(())
    }

    pub fn set_travel_date(&mut self, travel_date: NaiveDate) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.travel_date = Some(travel_date);
        Ok(())
    }

    /// Changing the party size drops any coupon back to idle with a zero discount; the
    /// returned quote already reflects that.
    pub fn set_traveler_count(&mut self, count: u32) -> Result<PriceQuote, DomainError> {
        self.ensure_editable()?;
        if !(1..=MAX_TRAVELERS).contains(&count) {
            return Err(DomainError::InvalidTravelerCount { count, max: MAX_TRAVELERS });
        }
        if count != self.traveler_count {
            self.traveler_count = count;
            self.dispatch(CouponEvent::TravelerCountChanged)?;
        }
        Ok(self.quote())
    }

    pub fn set_coupon_code(&mut self, code: &str) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if code != self.coupon_code {
            self.coupon_code = code.to_string();
            self.dispatch(CouponEvent::CodeEdited)?;
        }
        Ok(())
    }

    /// Moves the coupon widget to `Validating` for the current code and subtotal.
    pub fn begin_coupon_validation(&mut self) -> Result<CouponRequest, DomainError> {
        self.ensure_editable()?;
        self.next_token += 1;
        // Malformed codes keep their trimmed text so the validator can reject them.
        let code = normalize_code(&self.coupon_code)
            .unwrap_or_else(|_| self.coupon_code.trim().to_string());
        let request = CouponRequest {
            token: self.next_token,
            code,
            subtotal: self.quote().subtotal,
        };
        self.dispatch(CouponEvent::ApplyRequested(request.clone()))?;
        Ok(request)
    }

    /// Feeds a validation answer back in. Answers for anything but the pending
    /// request fail with a stale-result error and leave the form untouched.
    pub fn finish_coupon_validation(
        &mut self,
        token: u64,
        result: Result<Decimal, ApiError>,
    ) -> Result<&CouponState, DomainError> {
        let event = match result {
            Ok(discount) => CouponEvent::DiscountGranted { token, discount },
            Err(error) => CouponEvent::CouponDeclined { token, message: error.user_message() },
        };
        if let Err(error) = self.dispatch(event) {
            debug!(
                event_name = "coupon.result_discarded",
                package_id = %self.package_id,
                token,
                error = %error,
                "discarded coupon result"
            );
            return Err(error);
        }
        Ok(&self.coupon)
    }

    /// Validates the entered code against the offer service. Rejections and transport
    /// failures both end in `Rejected` with a user-facing message; the quote keeps a
    /// zero discount either way.
    pub async fn apply_coupon<A>(&mut self, api: &A) -> Result<&CouponState, DomainError>
    where
        A: OfferApi + ?Sized,
    {
        let request = self.begin_coupon_validation()?;
        let validator = CouponValidator::new(api);
        let result = validator.validate(&request.code, &self.package_id, request.subtotal).await;
        self.finish_coupon_validation(request.token, result)
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), DomainError> {
        validate_details(&self.customer, self.travel_date, self.traveler_count, today)
    }

    /// Snapshot of the form as a booking request, charged at the current quote total.
    pub fn build_request(&self, today: NaiveDate) -> Result<BookingRequest, DomainError> {
        self.validate(today)?;
        let travel_date = self.travel_date.ok_or_else(|| {
            DomainError::Validation(vec![FieldError::new("travel_date", "Pick a travel date.")])
        })?;
        let quote = self.quote();

        Ok(BookingRequest {
            package_id: self.package_id.clone(),
            customer_name: self.customer.name.trim().to_string(),
            customer_email: self.customer.email.trim().to_string(),
            customer_phone: self.customer.phone.trim().to_string(),
            travel_date,
            number_of_travelers: self.traveler_count,
            total_amount: quote.total,
            coupon_code: self.coupon.applied_code().map(str::to_string),
            currency: self.currency,
            language: self.language,
        })
    }

    /// Creates the booking, then the payment order for the same total and currency.
    ///
    /// A failed booking never reaches the payment call. When only the payment order
    /// fails, the form keeps the booking id and the next submit retries the payment
    /// order alone.
    pub async fn submit<A>(
        &mut self,
        api: &A,
        today: NaiveDate,
    ) -> Result<BookingConfirmation, CheckoutError>
    where
        A: BookingApi + ?Sized,
    {
        let (booking_id, request) = match &self.submission {
            SubmissionState::Confirmed { booking_id, .. } => {
                return Err(CheckoutError::AlreadyConfirmed { booking_id: booking_id.clone() });
            }
            SubmissionState::AwaitingPayment { booking_id, request } => {
                info!(
                    event_name = "booking.payment_retry",
                    booking_id = %booking_id,
                    "retrying payment order for existing booking"
                );
                (booking_id.clone(), request.clone())
            }
            SubmissionState::Editing => {
                let request = self.build_request(today)?;
                let receipt = match api.create_booking(&request).await {
                    Ok(receipt) => receipt,
                    Err(error) => {
                        warn!(
                            event_name = "booking.create_failed",
                            package_id = %request.package_id,
                            error_class = error.class(),
                            error = %error,
                            "booking creation failed"
                        );
                        return Err(CheckoutError::BookingFailed(error));
                    }
                };
                info!(
                    event_name = "booking.created",
                    booking_id = %receipt.id,
                    package_id = %request.package_id,
                    travelers = request.number_of_travelers,
                    total = %request.total_amount,
                    currency = request.currency.code(),
                    "booking created"
                );
                self.submission = SubmissionState::AwaitingPayment {
                    booking_id: receipt.id.clone(),
                    request: request.clone(),
                };
                (receipt.id, request)
            }
        };

        let order_request = PaymentOrderRequest {
            booking_id: booking_id.clone(),
            amount: request.total_amount,
            currency: request.currency,
        };
        match api.create_payment_order(&order_request).await {
            Ok(payment_order) => {
                let order_id = payment_order.order_id().map(str::to_string);
                info!(
                    event_name = "booking.payment_order_created",
                    booking_id = %booking_id,
                    order_id = order_id.as_deref().unwrap_or("unknown"),
                    "payment order created"
                );
                self.submission =
                    SubmissionState::Confirmed { booking_id: booking_id.clone(), order_id };
                Ok(BookingConfirmation { booking_id, request, payment_order })
            }
            Err(error) => {
                warn!(
                    event_name = "booking.payment_order_failed",
                    booking_id = %booking_id,
                    error_class = error.class(),
                    error = %error,
                    "payment order failed after booking was created"
                );
                Err(CheckoutError::PaymentOrderFailed { booking_id, source: error })
            }
        }
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        match self.submission.booking_id() {
            Some(booking_id) => {
                Err(DomainError::BookingLocked { booking_id: booking_id.to_string() })
            }
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, event: CouponEvent) -> Result<(), DomainError> {
        let outcome = self.flow.apply(&self.coupon, event)?;
        debug!(
            event_name = "coupon.transition",
            package_id = %self.package_id,
            from = ?outcome.from,
            to = ?outcome.to.phase(),
            event = ?outcome.event,
            "coupon state changed"
        );
        self.coupon = outcome.to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::api::{BookingApi, OfferApi};
    use crate::currency::CurrencyCode;
    use crate::domain::booking::{
        BookingId, BookingReceipt, BookingRequest, CouponValidation, CouponValidationRequest,
        PaymentOrder, PaymentOrderRequest,
    };
    use crate::domain::package::Package;
    use crate::errors::{ApiError, DomainError};
    use crate::flows::{CouponPhase, CouponState, FlowTransitionError};
    use crate::preferences::Language;

    use super::{validate_details, BookingForm, CheckoutError, CustomerDetails, SubmissionState};

    fn rupees(amount: i64) -> Decimal {
        Decimal::new(amount, 0)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date")
    }

    fn package(price: i64) -> Package {
        serde_json::from_value(serde_json::json!({
            "_id": "kedarnath-yatra",
            "slug": "kedarnath-yatra",
            "name": "Kedarnath Yatra",
            "price": price,
            "duration": "6 Days"
        }))
        .expect("package fixture")
    }

    fn customer() -> CustomerDetails {
        CustomerDetails::new("Asha Rawat", "asha@example.in", "+91 98100 12345")
    }

    fn ready_form(price: i64, travelers: u32) -> BookingForm {
        let mut form = BookingForm::new(&package(price), CurrencyCode::Inr, Language::En)
            .expect("bookable price");
        form.set_customer(customer()).expect("editable");
        form.set_travel_date(NaiveDate::from_ymd_opt(2026, 5, 10).expect("valid date"))
            .expect("editable");
        form.set_traveler_count(travelers).expect("valid party size");
        form
    }

    struct FixedOffers(Result<CouponValidation, ApiError>);

    #[async_trait]
    impl OfferApi for FixedOffers {
        async fn validate_coupon(
            &self,
            _request: &CouponValidationRequest,
        ) -> Result<CouponValidation, ApiError> {
            self.0.clone()
        }
    }

    fn granting(discount: i64) -> FixedOffers {
        FixedOffers(Ok(CouponValidation { discount_amount: rupees(discount) }))
    }

    #[derive(Default)]
    struct RecordingBookings {
        bookings: Mutex<Vec<BookingRequest>>,
        orders: Mutex<Vec<PaymentOrderRequest>>,
        booking_error: Option<ApiError>,
        payment_errors: Mutex<Vec<ApiError>>,
    }

    #[async_trait]
    impl BookingApi for RecordingBookings {
        async fn create_booking(
            &self,
            request: &BookingRequest,
        ) -> Result<BookingReceipt, ApiError> {
            self.bookings.lock().expect("bookings lock").push(request.clone());
            match &self.booking_error {
                Some(error) => Err(error.clone()),
                None => Ok(BookingReceipt { id: BookingId("bk_123".to_string()) }),
            }
        }

        async fn create_payment_order(
            &self,
            request: &PaymentOrderRequest,
        ) -> Result<PaymentOrder, ApiError> {
            self.orders.lock().expect("orders lock").push(request.clone());
            if let Some(error) = self.payment_errors.lock().expect("payment lock").pop() {
                return Err(error);
            }
            Ok(PaymentOrder(serde_json::json!({ "orderId": "order_9", "status": "created" })))
        }
    }

    #[derive(Default)]
    struct RecordingOffers {
        calls: Mutex<Vec<CouponValidationRequest>>,
    }

    #[async_trait]
    impl OfferApi for RecordingOffers {
        async fn validate_coupon(
            &self,
            request: &CouponValidationRequest,
        ) -> Result<CouponValidation, ApiError> {
            self.calls.lock().expect("calls lock").push(request.clone());
            Ok(CouponValidation { discount_amount: rupees(1_500) })
        }
    }

    #[tokio::test]
    async fn coupon_discount_reduces_total() {
        let mut form = ready_form(15_000, 2);
        assert_eq!(form.quote().subtotal, rupees(30_000));

        form.set_coupon_code("yatra10").expect("editable");
        let state = form.apply_coupon(&granting(3_000)).await.expect("coupon flow");

        assert_eq!(state.phase(), CouponPhase::Applied);
        assert_eq!(form.quote().discount, rupees(3_000));
        assert_eq!(form.quote().total, rupees(27_000));
    }

    #[tokio::test]
    async fn invalid_coupon_keeps_full_price() {
        let mut form = ready_form(9_000, 1);
        form.set_coupon_code("NOPE").expect("editable");

        let offers = FixedOffers(Err(ApiError::invalid_coupon("this code has expired")));
        let state = form.apply_coupon(&offers).await.expect("coupon flow");

        assert_eq!(state.phase(), CouponPhase::Rejected);
        assert!(state.error_message().expect("message shown").contains("expired"));
        assert_eq!(form.quote().discount, Decimal::ZERO);
        assert_eq!(form.quote().total, rupees(9_000));
    }

    #[tokio::test]
    async fn over_discount_clamps_to_zero() {
        let mut form = ready_form(5_000, 1);
        form.set_coupon_code("FREEBIE").expect("editable");

        form.apply_coupon(&granting(6_000)).await.expect("coupon flow");

        assert_eq!(form.quote().total, Decimal::ZERO);
        assert_eq!(form.quote().discount, rupees(5_000));
    }

    #[tokio::test]
    async fn traveler_change_resets_coupon() {
        let mut form = ready_form(10_000, 2);
        form.set_coupon_code("GROUP").expect("editable");
        form.apply_coupon(&granting(2_000)).await.expect("coupon flow");
        assert_eq!(form.quote().total, rupees(18_000));

        let quote = form.set_traveler_count(3).expect("valid party size");

        assert_eq!(form.coupon_state(), &CouponState::Idle);
        assert_eq!(quote.discount, Decimal::ZERO);
        assert_eq!(quote.total, rupees(30_000));
    }

    #[tokio::test]
    async fn payment_failure_keeps_booking_reference() {
        let mut form = ready_form(15_000, 2);
        let api = RecordingBookings {
            payment_errors: Mutex::new(vec![ApiError::ServiceUnavailable { status: 502 }]),
            ..RecordingBookings::default()
        };

        let error = form.submit(&api, today()).await.expect_err("payment order fails");

        assert_eq!(error.booking_id(), Some(&BookingId("bk_123".to_string())));
        assert!(error.user_message().contains("bk_123"));
        assert!(matches!(form.submission(), SubmissionState::AwaitingPayment { .. }));
        assert!(matches!(
            form.set_traveler_count(4),
            Err(DomainError::BookingLocked { .. })
        ));

        let confirmation = form.submit(&api, today()).await.expect("payment retry succeeds");

        assert_eq!(confirmation.booking_id.0, "bk_123");
        assert_eq!(confirmation.payment_order.order_id(), Some("order_9"));
        assert_eq!(api.bookings.lock().expect("bookings lock").len(), 1);
        assert_eq!(api.orders.lock().expect("orders lock").len(), 2);
    }

    #[tokio::test]
    async fn failed_booking_never_requests_payment() {
        let mut form = ready_form(9_000, 1);
        let api = RecordingBookings {
            booking_error: Some(ApiError::Timeout { secs: 20 }),
            ..RecordingBookings::default()
        };

        let error = form.submit(&api, today()).await.expect_err("booking fails");

        assert!(matches!(error, CheckoutError::BookingFailed(ApiError::Timeout { .. })));
        assert_eq!(error.booking_id(), None);
        assert!(api.orders.lock().expect("orders lock").is_empty());
        assert_eq!(form.submission(), &SubmissionState::Editing);
    }

    #[tokio::test]
    async fn submit_charges_quote_total_with_applied_code() {
        let mut form = ready_form(15_000, 2);
        form.set_coupon_code(" yatra10 ").expect("editable");
        form.apply_coupon(&granting(3_000)).await.expect("coupon flow");
        let api = RecordingBookings::default();

        let confirmation = form.submit(&api, today()).await.expect("booking confirmed");

        assert_eq!(confirmation.request.total_amount, rupees(27_000));
        assert_eq!(confirmation.request.coupon_code.as_deref(), Some("YATRA10"));
        let orders = api.orders.lock().expect("orders lock");
        assert_eq!(orders[0].amount, rupees(27_000));
        assert_eq!(orders[0].currency, CurrencyCode::Inr);
        drop(orders);

        let again = form.submit(&api, today()).await.expect_err("already confirmed");
        assert!(matches!(again, CheckoutError::AlreadyConfirmed { .. }));
    }

    #[tokio::test]
    async fn booking_carries_the_code_the_offer_service_accepted() {
        let mut form = ready_form(15_000, 1);
        form.set_coupon_code("  monsoon-15 ").expect("editable");
        let offers = RecordingOffers::default();

        form.apply_coupon(&offers).await.expect("coupon flow");
        let api = RecordingBookings::default();
        let confirmation = form.submit(&api, today()).await.expect("booking confirmed");

        let calls = offers.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].code, "MONSOON-15");
        assert_eq!(confirmation.request.coupon_code.as_deref(), Some(calls[0].code.as_str()));
        assert_eq!(confirmation.request.total_amount, rupees(13_500));
    }

    #[tokio::test]
    async fn malformed_code_is_rejected_without_calling_offer_service() {
        let mut form = ready_form(15_000, 1);
        form.set_coupon_code("  ").expect("editable");
        let offers = RecordingOffers::default();

        let state = form.apply_coupon(&offers).await.expect("coupon flow");

        assert_eq!(state.phase(), CouponPhase::Rejected);
        assert!(offers.calls.lock().expect("calls lock").is_empty());
        assert_eq!(form.quote().discount, Decimal::ZERO);
    }

    #[test]
    fn packages_priced_out_of_range_cannot_be_booked() {
        let mut pricey = package(9_000);
        pricey.price = Decimal::MAX;

        let error = BookingForm::new(&pricey, CurrencyCode::Inr, Language::En)
            .expect_err("price out of range");

        assert!(matches!(error, DomainError::PriceOutOfRange { .. }));
    }

    #[tokio::test]
    async fn invalid_fields_block_submission_without_network() {
        let mut form = BookingForm::new(&package(9_000), CurrencyCode::Inr, Language::Hi)
            .expect("bookable price");
        form.set_customer(CustomerDetails::new("", "not-an-email", "12")).expect("editable");
        let api = RecordingBookings::default();

        let error = form.submit(&api, today()).await.expect_err("validation fails");

        let CheckoutError::Domain(DomainError::Validation(fields)) = &error else {
            panic!("expected validation error, got {error:?}");
        };
        let names: Vec<_> = fields.iter().map(|field| field.field).collect();
        assert_eq!(names, vec!["customer_name", "customer_email", "customer_phone", "travel_date"]);
        assert!(api.bookings.lock().expect("bookings lock").is_empty());
    }

    #[test]
    fn traveler_count_is_bounded() {
        let mut form = BookingForm::new(&package(9_000), CurrencyCode::Inr, Language::En)
            .expect("bookable price");

        assert_eq!(
            form.set_traveler_count(0),
            Err(DomainError::InvalidTravelerCount { count: 0, max: 50 })
        );
        assert!(form.set_traveler_count(51).is_err());
        assert_eq!(form.set_traveler_count(50).expect("upper bound").subtotal, rupees(450_000));
    }

    #[test]
    fn result_for_superseded_request_is_discarded() {
        let mut form = ready_form(10_000, 2);
        form.set_coupon_code("GROUP").expect("editable");
        let first = form.begin_coupon_validation().expect("idle -> validating");

        form.set_traveler_count(3).expect("valid party size");
        let error = form
            .finish_coupon_validation(first.token, Ok(rupees(2_000)))
            .expect_err("stale answer");

        assert_eq!(
            error,
            DomainError::Coupon(FlowTransitionError::StaleResult { token: first.token })
        );
        assert_eq!(form.quote().discount, Decimal::ZERO);
    }

    #[test]
    fn past_travel_dates_are_rejected() {
        let yesterday = today().pred_opt().expect("valid date");

        let error = validate_details(&customer(), Some(yesterday), 2, today())
            .expect_err("date in the past");

        assert!(error.user_message().contains("past"));
        assert!(validate_details(&customer(), Some(today()), 2, today()).is_ok());
    }
}
