use crate::core::{CreatePaymentRequest, PaymentProvider, ProviderPayment};
use crate::utils::error::{GatewayError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.mollie.com";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const CREATE_FAILED: &str = "failed to create payment";
const RETRIEVE_FAILED: &str = "failed to retrieve payment";

/// Mollie v2 Payments API client
#[derive(Debug, Clone)]
pub struct MollieClient {
    base_url: String,
    client: Client,
}

impl MollieClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConfigValidation {
                field: "http_client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn payments_url(&self) -> String {
        format!("{}/v2/payments", self.base_url)
    }

    /// transaction id 作為單一路徑片段，`/`、`?` 等字元會被編碼
    fn payment_url(&self, transaction_id: &str) -> Result<url::Url> {
        let invalid = |message: String| GatewayError::ConfigValidation {
            field: "base_url".to_string(),
            message,
        };
        let mut url = url::Url::parse(&self.payments_url()).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(transaction_id);
        Ok(url)
    }

    /// 非 2xx 或連線失敗都轉為 ProviderRequest
    async fn parse_response(
        response: std::result::Result<Response, reqwest::Error>,
        failure: &str,
    ) -> Result<ProviderPayment> {
        let response = response.map_err(|e| {
            tracing::error!("❌ {}: {}", failure, e);
            GatewayError::provider_request(failure, e.status().map(|s| s.as_u16()), &e.to_string())
        })?;

        let status = response.status();
        tracing::debug!("Provider response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("❌ {} (HTTP {})", failure, status.as_u16());
            return Err(GatewayError::provider_request(
                failure,
                Some(status.as_u16()),
                &body,
            ));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            GatewayError::provider_request(failure, Some(status.as_u16()), &e.to_string())
        })?;

        Ok(ProviderPayment::from_json(raw))
    }
}

#[async_trait::async_trait]
impl PaymentProvider for MollieClient {
    async fn create_payment(
        &self,
        api_key: &str,
        request: &CreatePaymentRequest,
    ) -> Result<ProviderPayment> {
        let url = self.payments_url();
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await;

        Self::parse_response(response, CREATE_FAILED).await
    }

    async fn get_payment(&self, api_key: &str, transaction_id: &str) -> Result<ProviderPayment> {
        let url = self.payment_url(transaction_id)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).bearer_auth(api_key).send().await;

        Self::parse_response(response, RETRIEVE_FAILED).await
    }
}
