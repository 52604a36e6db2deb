use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::flows::FlowTransitionError;

/// Failure of a call against the booking backend.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("{resource} `{id}` was not found")]
    NotFound { resource: String, id: String },
    #[error("coupon rejected: {message}")]
    InvalidCoupon { message: String },
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("network failure: {0}")]
    Network(String),
    #[error("service unavailable (status {status})")]
    ServiceUnavailable { status: u16 },
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into(), id: id.into() }
    }

    pub fn invalid_coupon(message: impl Into<String>) -> Self {
        Self::InvalidCoupon { message: message.into() }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, .. } => {
                format!("We couldn't find that {resource}. Head back to the listing and pick another one.")
            }
            Self::InvalidCoupon { message } => {
                format!("This coupon can't be applied: {message}")
            }
            Self::Rejected { message, .. } => {
                format!("The request was not accepted: {message}")
            }
            Self::Network(_) | Self::ServiceUnavailable { .. } | Self::Decode(_) => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            Self::Timeout { .. } => {
                "The request took too long to complete. Please try again.".to_string()
            }
        }
    }

    /// Whether re-issuing the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::ServiceUnavailable { .. } | Self::Timeout { .. }
        )
    }

    /// Stable machine-readable class, used in CLI payloads and log fields.
    pub fn class(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidCoupon { .. } => "invalid_coupon",
            Self::Rejected { .. } => "rejected",
            Self::Network(_) => "network",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("traveler count must be between 1 and {max}, got {count}")]
    InvalidTravelerCount { count: u32, max: u32 },
    #[error(transparent)]
    Coupon(#[from] FlowTransitionError),
    #[error("booking `{booking_id}` is already in progress; the form can no longer be edited")]
    BookingLocked { booking_id: String },
    #[error("unit price {price} is outside the supported range 0..={max}")]
    PriceOutOfRange { price: Decimal, max: Decimal },
}

impl DomainError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(fields) => fields
                .iter()
                .map(|field| field.message.clone())
                .collect::<Vec<_>>()
                .join(" "),
            Self::InvalidTravelerCount { max, .. } => {
                format!("Please choose between 1 and {max} travelers.")
            }
            Self::Coupon(_) => "Please wait for the current coupon check to finish.".to_string(),
            Self::BookingLocked { booking_id } => {
                format!("Your booking {booking_id} has already been created.")
            }
            Self::PriceOutOfRange { .. } => {
                "This price is outside the range we can quote. Please contact us.".to_string()
            }
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|field| format!("{}: {}", field.field, field.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApiError, DomainError, FieldError};

    #[test]
    fn transient_failures_share_a_generic_retry_message() {
        let network = ApiError::Network("connection reset".to_owned());
        let unavailable = ApiError::ServiceUnavailable { status: 503 };

        assert_eq!(network.user_message(), unavailable.user_message());
        assert!(network.user_message().contains("try again"));
        assert!(network.is_transient());
        assert!(!ApiError::invalid_coupon("expired").is_transient());
    }

    #[test]
    fn timeout_has_its_own_message() {
        let timeout = ApiError::Timeout { secs: 20 };

        assert!(timeout.user_message().contains("too long"));
        assert_eq!(timeout.class(), "timeout");
    }

    #[test]
    fn not_found_points_back_to_listing() {
        let error = ApiError::not_found("package", "chopta-tungnath");

        assert_eq!(error.to_string(), "package `chopta-tungnath` was not found");
        assert!(error.user_message().contains("listing"));
    }

    #[test]
    fn validation_error_lists_every_field() {
        let error = DomainError::Validation(vec![
            FieldError::new("customer_email", "Enter a valid email address."),
            FieldError::new("travel_date", "Pick a travel date."),
        ]);

        let rendered = error.to_string();
        assert!(rendered.contains("customer_email"));
        assert!(rendered.contains("travel_date"));
        assert_eq!(error.user_message(), "Enter a valid email address. Pick a travel date.");
    }
}
