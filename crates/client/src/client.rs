use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use trekdesk_core::api::{BookingApi, CatalogApi, FavoritesApi, OfferApi};
use trekdesk_core::config::ApiConfig;
use trekdesk_core::errors::ApiError;
use trekdesk_core::{
    BookingReceipt, BookingRequest, CouponValidation, CouponValidationRequest, Package,
    PackageId, PackageQuery, Page, Pagination, PaymentOrder, PaymentOrderRequest, UserId,
};
use uuid::Uuid;

use crate::response::{decode, status_error, Envelope, FavoritesPayload, Rejection};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("api base url `{0}` must be an absolute http:// or https:// URL")]
    InvalidBaseUrl(String),
    #[error("could not build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Backend client. Every call carries a fresh correlation id and the configured timeout;
/// nothing is retried.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth_token: Option<SecretString>,
    timeout_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteBody<'a> {
    package_id: &'a PackageId,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(config.base_url.trim())
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidBaseUrl(config.base_url.clone()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("trekdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            auth_token: config.auth_token.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cheapest request the backend answers: the first listing page with one item.
    pub async fn ping(&self) -> Result<Pagination, ApiError> {
        let query = PackageQuery { limit: Some(1), ..PackageQuery::default() };
        let page = self.list_packages(&query).await?;
        Ok(page.pagination)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        rejection: Rejection<'_>,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        let correlation_id = Uuid::new_v4().to_string();

        let mut request =
            self.http.request(method.clone(), url).header(CORRELATION_HEADER, &correlation_id);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let started = Instant::now();
        let result = match build(request).send().await {
            Ok(response) => self.read(response, rejection).await,
            Err(error) => Err(self.transport_error(error)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(
                event_name = "api.request.completed",
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                elapsed_ms,
                "backend call completed"
            ),
            Err(error) => warn!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                elapsed_ms,
                error_class = error.class(),
                error = %error,
                "backend call failed"
            ),
        }
        result
    }

    async fn read(
        &self,
        response: Response,
        rejection: Rejection<'_>,
    ) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|error| self.transport_error(error))?;
        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(status_error(status, &String::from_utf8_lossy(&body), rejection))
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout { secs: self.timeout_secs }
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        rejection: Rejection<'_>,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let body =
            self.execute(Method::GET, segments, rejection, |request| request.query(query)).await?;
        decode(&body)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        rejection: Rejection<'_>,
        payload: &B,
    ) -> Result<T, ApiError> {
        let body =
            self.execute(Method::POST, segments, rejection, |request| request.json(payload)).await?;
        decode(&body)
    }
}

#[async_trait]
impl CatalogApi for ApiClient {
    async fn list_packages(&self, query: &PackageQuery) -> Result<Page<Package>, ApiError> {
        self.get_json(&["packages"], Rejection::Generic, &query.to_query_pairs()).await
    }

    async fn get_package(&self, id: &PackageId) -> Result<Package, ApiError> {
        let rejection = Rejection::Lookup { resource: "package", id: &id.0 };
        let segments = ["packages", id.0.as_str()];
        let envelope: Envelope<Package> = self.get_json(&segments, rejection, &[]).await?;
        Ok(envelope.into_inner())
    }
}

#[async_trait]
impl BookingApi for ApiClient {
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingReceipt, ApiError> {
        let envelope: Envelope<BookingReceipt> =
            self.post_json(&["bookings"], Rejection::Generic, request).await?;
        Ok(envelope.into_inner())
    }

    async fn create_payment_order(
        &self,
        request: &PaymentOrderRequest,
    ) -> Result<PaymentOrder, ApiError> {
        self.post_json(&["payments", "orders"], Rejection::Generic, request).await
    }
}

#[async_trait]
impl OfferApi for ApiClient {
    async fn validate_coupon(
        &self,
        request: &CouponValidationRequest,
    ) -> Result<CouponValidation, ApiError> {
        self.post_json(&["offers", "validate"], Rejection::Coupon, request).await
    }
}

#[async_trait]
impl FavoritesApi for ApiClient {
    async fn favorites(&self, user_id: &UserId) -> Result<Vec<Package>, ApiError> {
        let rejection = Rejection::Lookup { resource: "user", id: &user_id.0 };
        let segments = ["users", user_id.0.as_str(), "favorites"];
        let payload: FavoritesPayload = self.get_json(&segments, rejection, &[]).await?;
        Ok(payload.into_packages())
    }

    async fn add_favorite(
        &self,
        user_id: &UserId,
        package_id: &PackageId,
    ) -> Result<(), ApiError> {
        let body = FavoriteBody { package_id };
        let segments = ["users", user_id.0.as_str(), "favorites"];
        self.execute(Method::POST, &segments, Rejection::Generic, |request| request.json(&body))
            .await?;
        Ok(())
    }

    async fn remove_favorite(
        &self,
        user_id: &UserId,
        package_id: &PackageId,
    ) -> Result<(), ApiError> {
        let segments = ["users", user_id.0.as_str(), "favorites", package_id.0.as_str()];
        self.execute(Method::DELETE, &segments, Rejection::Generic, |request| request).await?;
        Ok(())
    }
}
