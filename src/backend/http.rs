//! HTTP client for the storefront backend

use super::models::{
    ApiEnvelope, CouponList, CouponValidation, CouponValidationRequest, OrderData, OrderRequest,
    PlacedOrder,
};
use super::CartBackend;
use crate::cart::models::{CartState, Coupon};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Joins a base URL and an endpoint with exactly one slash between them.
pub fn build_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// reqwest-based [`CartBackend`]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.session_token.clone(),
        })
    }

    /// Set the session token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        build_api_url(&self.base_url, endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Decodes an API envelope regardless of the status code.
    ///
    /// A non-success status always yields `success == false`. When such a
    /// response carries no envelope the raw body is returned as
    /// [`ClientError::Status`].
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> ClientResult<ApiEnvelope<T>> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(mut envelope) => {
                if !status.is_success() {
                    envelope.success = false;
                }
                Ok(envelope)
            }
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(ClientError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait]
impl CartBackend for HttpBackend {
    async fn sync_cart(&self, state: &CartState) -> ClientResult<()> {
        let request = self.authorize(self.client.put(self.url("/cart/sync")).json(state));
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(items = state.items.len(), "cart synced");
        Ok(())
    }

    async fn validate_coupon(
        &self,
        request: &CouponValidationRequest,
    ) -> ClientResult<CouponValidation> {
        let builder = self.client.post(self.url("/coupons/validate")).json(request);
        let response = self.authorize(builder).send().await?;
        Self::read_envelope(response).await
    }

    async fn list_coupons(&self) -> ClientResult<Vec<Coupon>> {
        let response = self.client.get(self.url("/coupons")).send().await?;
        let envelope = Self::read_envelope::<CouponList>(response).await?;

        match envelope {
            ApiEnvelope {
                success: true,
                data: Some(list),
                ..
            } => Ok(list.coupons),
            ApiEnvelope { message, .. } => Err(ClientError::InvalidResponse(
                message.unwrap_or_else(|| "Missing coupon list".to_string()),
            )),
        }
    }

    async fn create_order(&self, order: &OrderRequest) -> ClientResult<ApiEnvelope<PlacedOrder>> {
        if self.token.is_none() {
            return Err(ClientError::Unauthorized);
        }

        let builder = self.client.post(self.url("/orders")).json(order);
        let response = self.authorize(builder).send().await?;
        let envelope = Self::read_envelope::<OrderData>(response).await?;

        Ok(ApiEnvelope {
            success: envelope.success,
            message: envelope.message,
            data: envelope.data.map(|d| d.order),
        })
    }

    fn has_session(&self) -> bool {
        self.token.is_some()
    }
}
