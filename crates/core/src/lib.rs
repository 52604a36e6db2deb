pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod favorites;
pub mod flows;
pub mod preferences;
pub mod pricing;
pub mod resource;

pub use api::{BookingApi, CatalogApi, FavoritesApi, OfferApi};
pub use catalog::{filter_packages, SlugCatalog};
pub use checkout::{
    validate_details, BookingConfirmation, BookingForm, CheckoutError, CustomerDetails,
    SubmissionState, MAX_TRAVELERS,
};
pub use coupon::{normalize_code, CouponValidator};
pub use currency::{format_amount, CurrencyCode, CurrencyError, CurrencyFormatter, ExchangeRates};
pub use domain::booking::{
    BookingId, BookingReceipt, BookingRequest, CouponValidation, CouponValidationRequest,
    PaymentOrder, PaymentOrderRequest,
};
pub use domain::customer::UserId;
pub use domain::package::{
    DurationRange, Package, PackageId, PackageQuery, Page, Pagination, SortOrder,
};
pub use errors::{ApiError, DomainError, FieldError};
pub use favorites::{toggle_favorite, FavoriteSet};
pub use flows::{CouponFlow, CouponPhase, CouponState, FlowTransitionError};
pub use preferences::{DisplayPreferences, Language, PreferenceReader, PreferenceStore};
pub use pricing::{check_unit_price, compute_quote, PriceQuote, QuoteDisplay, MAX_UNIT_PRICE};
pub use resource::{LoadTicket, RemoteResource, Resource};
