use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::OfferApi;
use crate::domain::booking::CouponValidationRequest;
use crate::domain::package::PackageId;
use crate::errors::ApiError;

const MAX_CODE_LEN: usize = 32;

/// Thin client-side wrapper around the offer service. It only answers "how much off";
/// applying the discount is the booking form's job.
pub struct CouponValidator<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A> CouponValidator<'a, A>
where
    A: OfferApi + ?Sized,
{
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn validate(
        &self,
        code: &str,
        package_id: &PackageId,
        total_amount: Decimal,
    ) -> Result<Decimal, ApiError> {
        let code = normalize_code(code)?;
        let request = CouponValidationRequest {
            code: code.clone(),
            package_id: package_id.clone(),
            total_amount,
        };

        match self.api.validate_coupon(&request).await {
            Ok(validation) if validation.discount_amount < Decimal::ZERO => {
                warn!(
                    event_name = "coupon.negative_discount",
                    coupon_code = %code,
                    package_id = %package_id,
                    discount = %validation.discount_amount,
                    "offer service returned a negative discount"
                );
                Err(ApiError::invalid_coupon("the offer service returned an invalid discount"))
            }
            Ok(validation) => {
                info!(
                    event_name = "coupon.validated",
                    coupon_code = %code,
                    package_id = %package_id,
                    discount = %validation.discount_amount,
                    "coupon accepted"
                );
                Ok(validation.discount_amount)
            }
            Err(error) => {
                warn!(
                    event_name = "coupon.validation_failed",
                    coupon_code = %code,
                    package_id = %package_id,
                    error_class = error.class(),
                    error = %error,
                    "coupon validation failed"
                );
                Err(error)
            }
        }
    }
}

/// Trims and upper-cases a code, rejecting blank or malformed input without a network call.
pub fn normalize_code(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(ApiError::invalid_coupon("enter a coupon code"));
    }
    if code.len() > MAX_CODE_LEN
        || !code.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ApiError::invalid_coupon("the coupon code is not in a valid format"));
    }
    Ok(code)
}
