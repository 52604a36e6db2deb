//! Seams to the booking backend. `trekdesk-client` implements these over HTTP; tests
//! implement them in memory.

use async_trait::async_trait;

use crate::domain::booking::{
    BookingReceipt, BookingRequest, CouponValidation, CouponValidationRequest, PaymentOrder,
    PaymentOrderRequest,
};
use crate::domain::customer::UserId;
use crate::domain::package::{Package, PackageId, PackageQuery, Page};
use crate::errors::ApiError;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_packages(&self, query: &PackageQuery) -> Result<Page<Package>, ApiError>;
    async fn get_package(&self, id: &PackageId) -> Result<Package, ApiError>;
}

#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingReceipt, ApiError>;
    async fn create_payment_order(
        &self,
        request: &PaymentOrderRequest,
    ) -> Result<PaymentOrder, ApiError>;
}

#[async_trait]
pub trait OfferApi: Send + Sync {
    async fn validate_coupon(
        &self,
        request: &CouponValidationRequest,
    ) -> Result<CouponValidation, ApiError>;
}

#[async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn favorites(&self, user_id: &UserId) -> Result<Vec<Package>, ApiError>;
    async fn add_favorite(&self, user_id: &UserId, package_id: &PackageId)
        -> Result<(), ApiError>;
    async fn remove_favorite(
        &self,
        user_id: &UserId,
        package_id: &PackageId,
    ) -> Result<(), ApiError>;
}
