//! Server wishlist client for authenticated visitors.
//!
//! The durable record lives behind a plain JSON endpoint: mutations are
//! POSTed as `{action, productId, ...}` and acknowledged with
//! `{success, action, productId}`; failures are status-coded with an
//! `{error}` body. The commerce platform's own schema stays out of scope -
//! only this request/response contract matters here.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use wishlist_core::{Image, PriceRange, ProductId, Wishlist, WishlistItem};

use crate::config::WishlistApiConfig;

/// Errors that can occur when talking to the wishlist endpoint.
///
/// All of these are recoverable at the sync controller level; none are
/// fatal to the process.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (network failure, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The visitor's session is not authenticated server-side.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server rejected the mutation (missing required item fields).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The server returned an unexpected error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The mutation was acknowledged but the follow-up reload of the
    /// authoritative record failed. The durable write landed; only the
    /// re-read did not, so callers must not treat this as a failed write.
    #[error("Mutation acknowledged but reload failed: {0}")]
    AckedWithoutReload(#[source] Box<ClientError>),
}

/// Contract for reading and mutating the authenticated visitor's durable
/// wishlist record.
///
/// `add`/`remove` return the authoritative post-mutation wishlist so the
/// controller can reconcile an optimistic guess against server-side dedup
/// or validation. Implementors are cheaply cloneable so commits can be
/// spawned off the calling task.
pub trait RemoteWishlist: Clone + Send + Sync + 'static {
    /// Fetch the current durable record.
    fn load(&self) -> impl Future<Output = Result<Wishlist, ClientError>> + Send;

    /// Submit the full item snapshot; the server appends if absent.
    fn add(&self, item: &WishlistItem) -> impl Future<Output = Result<Wishlist, ClientError>> + Send;

    /// Submit the id; the server removes if present.
    fn remove(&self, id: &ProductId) -> impl Future<Output = Result<Wishlist, ClientError>> + Send;
}

// =============================================================================
// Wire types
// =============================================================================

/// Mutation request body.
///
/// `productTitle`/`productHandle`/`productImage`/`productPrice` are
/// required only for `add`. `addedAt` lets the migration backdate a
/// shared item to the earlier timestamp.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MutationRequest<'a> {
    action: &'a str,
    product_id: &'a ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_handle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_image: Option<&'a Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_price: Option<&'a PriceRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    added_at: Option<DateTime<Utc>>,
}

/// Successful mutation acknowledgement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationAck {
    success: bool,
    #[allow(dead_code)]
    action: String,
    #[allow(dead_code)]
    product_id: ProductId,
}

/// Error body for status-coded failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// =============================================================================
// HttpWishlistClient
// =============================================================================

/// JSON-over-HTTP implementation of [`RemoteWishlist`].
#[derive(Clone)]
pub struct HttpWishlistClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpWishlistClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &WishlistApiConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| ClientError::Parse(format!("Invalid access token format: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.to_string(),
        })
    }

    /// Map a non-success response to a `ClientError`.
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => "(no error details provided)".to_string(),
        };

        match status.as_u16() {
            401 | 403 => ClientError::NotAuthenticated,
            400 | 422 => ClientError::Validation(message),
            status => ClientError::Api { status, message },
        }
    }

    async fn fetch(&self) -> Result<Wishlist, ClientError> {
        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let items: Vec<WishlistItem> = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(Wishlist::from_items(items))
    }

    async fn mutate(&self, request: MutationRequest<'_>) -> Result<Wishlist, ClientError> {
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let ack: MutationAck = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        if !ack.success {
            return Err(ClientError::Api {
                status: 200,
                message: "Mutation not acknowledged".to_string(),
            });
        }

        // The ack carries no wishlist; re-load to return authoritative
        // state. Past this point the write has committed server-side, so
        // a reload failure is reported as its own variant.
        self.fetch()
            .await
            .map_err(|e| ClientError::AckedWithoutReload(Box::new(e)))
    }
}

impl RemoteWishlist for HttpWishlistClient {
    #[instrument(skip(self))]
    async fn load(&self) -> Result<Wishlist, ClientError> {
        self.fetch().await
    }

    #[instrument(skip(self, item), fields(product_id = %item.id))]
    async fn add(&self, item: &WishlistItem) -> Result<Wishlist, ClientError> {
        self.mutate(MutationRequest {
            action: "add",
            product_id: &item.id,
            product_title: Some(&item.title),
            product_handle: Some(&item.handle),
            product_image: item.image.as_ref(),
            product_price: item.price_range.as_ref(),
            added_at: Some(item.added_at),
        })
        .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn remove(&self, id: &ProductId) -> Result<Wishlist, ClientError> {
        self.mutate(MutationRequest {
            action: "remove",
            product_id: id,
            product_title: None,
            product_handle: None,
            product_image: None,
            product_price: None,
            added_at: None,
        })
        .await
    }
}
