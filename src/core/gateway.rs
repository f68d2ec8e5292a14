use crate::core::amount::format_amount;
use crate::core::{
    Amount, CompletionOutcome, CreatePaymentRequest, GatewayConfigProvider, PaymentMetadata,
    PaymentProvider, PaymentRecord, PaymentRecordStore, RedirectTarget,
};
use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{validate_currency_code, validate_non_negative};
use std::collections::HashMap;

pub const PAYMENT_ID_PARAM: &str = "payment_id";

/// 使用者付款後返回的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    /// 回到 callback URL，由 `confirm` 確認後再導向 success URL
    #[default]
    Callback,
    /// 直接回到 success URL，付款狀態只靠 webhook 更新
    Success,
}

impl RedirectMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "callback" => Ok(RedirectMode::Callback),
            "success" => Ok(RedirectMode::Success),
            other => Err(GatewayError::InvalidValue {
                field: "redirect_mode".to_string(),
                value: other.to_string(),
                reason: "Expected 'callback' or 'success'".to_string(),
            }),
        }
    }
}

fn redirect_mode<C: GatewayConfigProvider>(config: &C) -> Result<RedirectMode> {
    config
        .field("redirect_mode")
        .map(RedirectMode::parse)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn send_webhook_url<C: GatewayConfigProvider>(config: &C) -> bool {
    config
        .field("send_webhook_url")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Parsed callback parameters from the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams(HashMap<String, String>);

impl CallbackParams {
    /// 解析 `a=1&b=2` 形式的 query string 或 form body
    pub fn from_query(raw: &str) -> Self {
        let raw = raw.trim_start_matches('?');
        Self(
            url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn payment_id(&self) -> Result<&str> {
        self.get(PAYMENT_ID_PARAM)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::MissingParameter {
                name: PAYMENT_ID_PARAM.to_string(),
            })
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

pub struct GatewayAdapter<P: PaymentProvider, S: PaymentRecordStore> {
    provider: P,
    store: S,
}

impl<P: PaymentProvider, S: PaymentRecordStore> GatewayAdapter<P, S> {
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn build_create_request<C: GatewayConfigProvider>(
        &self,
        payment: &PaymentRecord,
        config: &C,
    ) -> Result<CreatePaymentRequest> {
        validate_non_negative("total", payment.total())?;
        validate_currency_code("currency", &payment.currency)?;

        let redirect_url = match redirect_mode(config)? {
            RedirectMode::Callback => payment.webhook_url(),
            RedirectMode::Success => payment.success_url(),
        };
        let webhook_url = send_webhook_url(config).then(|| payment.webhook_url().to_string());

        Ok(CreatePaymentRequest {
            amount: Amount {
                currency: payment.currency.clone(),
                value: format_amount(payment.total())?,
            },
            description: payment.description.clone(),
            cancel_url: payment.cancel_url().to_string(),
            redirect_url: redirect_url.to_string(),
            webhook_url,
            metadata: PaymentMetadata {
                payment_id: payment.id.clone(),
            },
        })
    }

    /// 在 provider 建立付款並回傳 checkout 導向位置。
    ///
    /// 先從 store 取得紀錄：不存在就不呼叫 provider，已完成則直接導向 success URL。
    /// 回應中有 id 時會先寫入 transaction id，再檢查 checkout 連結；
    /// 因此即使缺少連結而失敗，id 仍然保留在紀錄上。
    pub async fn initiate<C: GatewayConfigProvider>(
        &self,
        payment: &PaymentRecord,
        config: &C,
    ) -> Result<RedirectTarget> {
        let stored = self
            .store
            .find(&payment.id)
            .await?
            .ok_or_else(|| GatewayError::PaymentNotFound {
                payment_id: payment.id.clone(),
            })?;

        if stored.is_paid() {
            tracing::info!("Payment {} already completed, not creating a new one", payment.id);
            return Ok(RedirectTarget::success(stored.success_url()));
        }

        let api_key = config.api_key()?;
        let request = self.build_create_request(payment, config)?;

        tracing::info!(
            "💳 Creating provider payment for {} ({} {})",
            payment.id,
            request.amount.value,
            request.amount.currency
        );
        let created = self.provider.create_payment(api_key, &request).await?;

        if let Some(transaction_id) = &created.id {
            self.store
                .set_transaction_id(&payment.id, transaction_id)
                .await?;
            tracing::debug!("Stored transaction id {} on {}", transaction_id, payment.id);
        }

        match created.checkout_url {
            Some(url) => Ok(RedirectTarget::checkout(url)),
            None => {
                tracing::warn!("Provider response for {} has no checkout link", payment.id);
                Err(GatewayError::MissingCheckoutUrl {
                    payment_id: payment.id.clone(),
                })
            }
        }
    }

    /// 處理 callback：查詢 provider 狀態並將付款標記為完成
    pub async fn confirm<C: GatewayConfigProvider>(
        &self,
        params: &CallbackParams,
        config: &C,
    ) -> Result<RedirectTarget> {
        let payment_id = params.payment_id()?;

        let record = self
            .store
            .find(payment_id)
            .await?
            .ok_or_else(|| GatewayError::PaymentNotFound {
                payment_id: payment_id.to_string(),
            })?;

        if record.is_paid() {
            tracing::debug!("Payment {} already completed, skipping provider", payment_id);
            return Ok(RedirectTarget::success(record.success_url()));
        }

        let transaction_id =
            record
                .transaction_id
                .as_deref()
                .ok_or_else(|| GatewayError::MissingTransactionId {
                    payment_id: payment_id.to_string(),
                })?;

        let api_key = config.api_key()?;
        let fetched = self.provider.get_payment(api_key, transaction_id).await?;

        if !fetched.is_paid() {
            // 回報 provider 原始字串，不用正規化後的 enum
            let status = fetched
                .raw
                .get("status")
                .and_then(|v| v.as_str())
                .map(ToString::to_string);
            tracing::warn!(
                "⚠️ Payment {} ({}) not paid, provider status: {:?}",
                payment_id,
                transaction_id,
                status
            );
            return Err(GatewayError::UnexpectedStatus {
                payment_id: payment_id.to_string(),
                status,
            });
        }

        let provider_id = fetched.id.as_deref().unwrap_or(transaction_id);
        let outcome = self
            .store
            .complete_if_pending(payment_id, provider_id, fetched.raw.clone())
            .await?;

        match outcome {
            CompletionOutcome::Completed => {
                tracing::info!("✅ Payment {} completed ({})", payment_id, provider_id)
            }
            CompletionOutcome::AlreadyCompleted => {
                tracing::info!("Payment {} was completed by a concurrent callback", payment_id)
            }
        }

        Ok(RedirectTarget::success(record.success_url()))
    }
}
