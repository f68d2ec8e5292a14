use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    #[default]
    Pending,
    Completed,
}

/// 由宿主系統建立的付款紀錄；本 crate 只寫入 transaction id 與完成狀態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub currency: String,
    pub total: Decimal,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
    pub webhook_url: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub provider_payload: Option<serde_json::Value>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn new(id: impl Into<String>, currency: impl Into<String>, total: Decimal) -> Self {
        Self {
            id: id.into(),
            currency: currency.into(),
            total,
            description: String::new(),
            success_url: String::new(),
            cancel_url: String::new(),
            webhook_url: String::new(),
            transaction_id: None,
            status: RecordStatus::Pending,
            provider_payload: None,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
        webhook_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self.webhook_url = webhook_url.into();
        self
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn success_url(&self) -> &str {
        &self.success_url
    }

    pub fn cancel_url(&self) -> &str {
        &self.cancel_url
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    pub fn is_paid(&self) -> bool {
        self.status == RecordStatus::Completed
    }

    /// 已完成的紀錄保留原本的 transaction id，回傳 false。
    pub fn update_transaction_id(&mut self, transaction_id: impl Into<String>) -> bool {
        if self.is_paid() {
            return false;
        }
        self.transaction_id = Some(transaction_id.into());
        true
    }

    /// 標記為已完成。已完成的紀錄不會被覆寫，回傳 false。
    pub fn completed(&mut self, provider_id: impl Into<String>, payload: serde_json::Value) -> bool {
        if self.is_paid() {
            return false;
        }
        self.transaction_id = Some(provider_id.into());
        self.provider_payload = Some(payload);
        self.status = RecordStatus::Completed;
        self.completed_at = Some(Utc::now());
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Created,
    Pending,
    Authorized,
    Paid,
    Canceled,
    Expired,
    Failed,
    Other(String),
}

impl ProviderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "open" | "created" => ProviderStatus::Created,
            "pending" => ProviderStatus::Pending,
            "authorized" => ProviderStatus::Authorized,
            "paid" => ProviderStatus::Paid,
            "canceled" => ProviderStatus::Canceled,
            "expired" => ProviderStatus::Expired,
            "failed" => ProviderStatus::Failed,
            other => ProviderStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProviderStatus::Created => "open",
            ProviderStatus::Pending => "pending",
            ProviderStatus::Authorized => "authorized",
            ProviderStatus::Paid => "paid",
            ProviderStatus::Canceled => "canceled",
            ProviderStatus::Expired => "expired",
            ProviderStatus::Failed => "failed",
            ProviderStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// provider 回應的暫時視圖，不做快取
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayment {
    pub id: Option<String>,
    pub status: Option<ProviderStatus>,
    pub checkout_url: Option<String>,
    pub raw: serde_json::Value,
}

impl ProviderPayment {
    /// Lenient parse: missing or mistyped fields become `None`.
    pub fn from_json(raw: serde_json::Value) -> Self {
        let id = raw.get("id").and_then(|v| v.as_str()).map(ToString::to_string);
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .map(ProviderStatus::parse);
        let checkout_url = raw
            .pointer("/_links/checkout/href")
            .and_then(|v| v.as_str())
            .map(ToString::to_string);

        Self {
            id,
            status,
            checkout_url,
            raw,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == Some(ProviderStatus::Paid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    pub payment_id: String,
}

/// `POST /v2/payments` 的請求內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: Amount,
    pub description: String,
    pub cancel_url: String,
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Checkout,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub url: String,
    pub kind: RedirectKind,
}

impl RedirectTarget {
    pub fn checkout(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RedirectKind::Checkout,
        }
    }

    pub fn success(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: RedirectKind::Success,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    AlreadyCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_completed_is_one_way() {
        let mut record = PaymentRecord::new("1", "EUR", dec!(10));
        record.update_transaction_id("tr_1");
        assert!(!record.is_paid());

        assert!(record.completed("tr_1", json!({"status": "paid"})));
        assert!(record.is_paid());
        let first_completion = record.completed_at;

        assert!(!record.completed("tr_2", json!({"status": "paid"})));
        assert_eq!(record.transaction_id.as_deref(), Some("tr_1"));
        assert_eq!(record.completed_at, first_completion);

        assert!(!record.update_transaction_id("tr_3"));
        assert_eq!(record.transaction_id.as_deref(), Some("tr_1"));
    }

    #[test]
    fn test_provider_payment_from_json() {
        let payment = ProviderPayment::from_json(json!({
            "resource": "payment",
            "id": "tr_WDqYK6vllg",
            "status": "open",
            "_links": {
                "checkout": {"href": "https://www.mollie.com/checkout/select-method/WDqYK6vllg"}
            }
        }));

        assert_eq!(payment.id.as_deref(), Some("tr_WDqYK6vllg"));
        assert_eq!(payment.status, Some(ProviderStatus::Created));
        assert_eq!(
            payment.checkout_url.as_deref(),
            Some("https://www.mollie.com/checkout/select-method/WDqYK6vllg")
        );
        assert!(!payment.is_paid());
    }

    #[test]
    fn test_provider_payment_tolerates_missing_fields() {
        let payment = ProviderPayment::from_json(json!({"status": 3}));
        assert_eq!(payment.id, None);
        assert_eq!(payment.status, None);
        assert_eq!(payment.checkout_url, None);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status = ProviderStatus::parse("chargeback");
        assert_eq!(status, ProviderStatus::Other("chargeback".to_string()));
        assert_eq!(status.to_string(), "chargeback");
    }

    #[test]
    fn test_create_request_serializes_camel_case() {
        let request = CreatePaymentRequest {
            amount: Amount {
                currency: "EUR".to_string(),
                value: "10.00".to_string(),
            },
            description: "Order 1".to_string(),
            cancel_url: "https://shop.test/cancel".to_string(),
            redirect_url: "https://shop.test/return".to_string(),
            webhook_url: None,
            metadata: PaymentMetadata {
                payment_id: "1".to_string(),
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["cancelUrl"], "https://shop.test/cancel");
        assert_eq!(value["redirectUrl"], "https://shop.test/return");
        assert_eq!(value["metadata"]["payment_id"], "1");
        assert!(value.get("webhookUrl").is_none());
    }
}
