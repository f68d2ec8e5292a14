use crate::domain::model::{CompletionOutcome, CreatePaymentRequest, PaymentRecord, ProviderPayment};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;

/// 付款紀錄的持久層。`complete_if_pending` 必須是原子的 compare-and-set。
pub trait PaymentRecordStore: Send + Sync {
    fn find(
        &self,
        payment_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<PaymentRecord>>> + Send;

    fn insert(&self, record: PaymentRecord) -> impl std::future::Future<Output = Result<()>> + Send;

    fn set_transaction_id(
        &self,
        payment_id: &str,
        transaction_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn complete_if_pending(
        &self,
        payment_id: &str,
        provider_id: &str,
        payload: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<CompletionOutcome>> + Send;
}

/// Gateway settings looked up by field name.
pub trait GatewayConfigProvider: Send + Sync {
    fn field(&self, name: &str) -> Option<&str>;

    fn api_key(&self) -> Result<&str> {
        match self.field("api_key") {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(GatewayError::MissingConfig {
                field: "api_key".to_string(),
            }),
        }
    }
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment(
        &self,
        api_key: &str,
        request: &CreatePaymentRequest,
    ) -> Result<ProviderPayment>;

    async fn get_payment(&self, api_key: &str, transaction_id: &str) -> Result<ProviderPayment>;
}
