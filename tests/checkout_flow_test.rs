use anyhow::Result;
use httpmock::prelude::*;
use mollie_checkout::core::{CompletionOutcome, PaymentRecordStore};
use mollie_checkout::{
    CallbackParams, GatewayAdapter, GatewayError, InMemoryPaymentStore, MollieClient,
    PaymentRecord, RedirectKind, StaticConfig,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 包裝 InMemoryPaymentStore，記錄實際寫入完成狀態的次數
#[derive(Clone, Default)]
struct CountingStore {
    inner: InMemoryPaymentStore,
    completions: Arc<AtomicUsize>,
}

impl PaymentRecordStore for CountingStore {
    async fn find(&self, payment_id: &str) -> mollie_checkout::Result<Option<PaymentRecord>> {
        self.inner.find(payment_id).await
    }

    async fn insert(&self, record: PaymentRecord) -> mollie_checkout::Result<()> {
        self.inner.insert(record).await
    }

    async fn set_transaction_id(
        &self,
        payment_id: &str,
        transaction_id: &str,
    ) -> mollie_checkout::Result<()> {
        self.inner.set_transaction_id(payment_id, transaction_id).await
    }

    async fn complete_if_pending(
        &self,
        payment_id: &str,
        provider_id: &str,
        payload: serde_json::Value,
    ) -> mollie_checkout::Result<CompletionOutcome> {
        let outcome = self
            .inner
            .complete_if_pending(payment_id, provider_id, payload)
            .await?;
        if outcome == CompletionOutcome::Completed {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }
}

fn record() -> PaymentRecord {
    PaymentRecord::new("order-1001", "EUR", dec!(19.999))
        .with_description("Order #1001")
        .with_urls(
            "https://shop.test/checkout/success",
            "https://shop.test/checkout/cancel",
            "https://shop.test/payments/callback?payment_id=order-1001",
        )
}

fn config() -> StaticConfig {
    StaticConfig::new().with("api_key", "test_integration")
}

async fn build_adapter(
    server: &MockServer,
) -> Result<GatewayAdapter<MollieClient, InMemoryPaymentStore>> {
    let client = MollieClient::new(server.base_url(), Duration::from_secs(5))?;
    let store = InMemoryPaymentStore::new();
    store.insert(record()).await?;
    Ok(GatewayAdapter::new(client, store))
}

/// 完整流程：建立付款 -> 使用者付款 -> callback 確認 -> 重複 callback
#[tokio::test]
async fn test_create_then_confirm_flow() -> Result<()> {
    let server = MockServer::start();

    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v2/payments")
            .header("Authorization", "Bearer test_integration")
            .json_body(json!({
                "amount": {"currency": "EUR", "value": "20.00"},
                "description": "Order #1001",
                "cancelUrl": "https://shop.test/checkout/cancel",
                "redirectUrl": "https://shop.test/payments/callback?payment_id=order-1001",
                "metadata": {"payment_id": "order-1001"}
            }));
        then.status(201)
            .header("Content-Type", "application/hal+json")
            .json_body(json!({
                "resource": "payment",
                "id": "tr_flow1",
                "status": "open",
                "_links": {"checkout": {"href": "https://www.mollie.com/checkout/tr_flow1"}}
            }));
    });

    let status_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v2/payments/tr_flow1")
            .header("Authorization", "Bearer test_integration");
        then.status(200)
            .header("Content-Type", "application/hal+json")
            .json_body(json!({
                "resource": "payment",
                "id": "tr_flow1",
                "status": "paid",
                "paidAt": "2026-10-18T10:00:00+00:00"
            }));
    });

    let adapter = build_adapter(&server).await?;

    let checkout = adapter.initiate(&record(), &config()).await?;
    assert_eq!(checkout.kind, RedirectKind::Checkout);
    assert_eq!(checkout.url, "https://www.mollie.com/checkout/tr_flow1");
    create_mock.assert();

    let params = CallbackParams::from_query("payment_id=order-1001");
    let first = adapter.confirm(&params, &config()).await?;
    let second = adapter.confirm(&params, &config()).await?;

    assert_eq!(first.kind, RedirectKind::Success);
    assert_eq!(first.url, "https://shop.test/checkout/success");
    assert_eq!(first, second);
    status_mock.assert_hits(1);

    let stored = adapter.store().find("order-1001").await?.unwrap();
    assert!(stored.is_paid());
    assert_eq!(stored.transaction_id.as_deref(), Some("tr_flow1"));
    assert_eq!(
        stored.provider_payload.as_ref().unwrap()["paidAt"],
        "2026-10-18T10:00:00+00:00"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_checkout_link_persists_id_then_fails() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(201)
            .json_body(json!({"id": "tr_nolink", "status": "open", "_links": {}}));
    });

    let adapter = build_adapter(&server).await?;
    let err = adapter.initiate(&record(), &config()).await.unwrap_err();

    assert!(matches!(err, GatewayError::MissingCheckoutUrl { .. }));
    let stored = adapter.store().find("order-1001").await?.unwrap();
    assert_eq!(stored.transaction_id.as_deref(), Some("tr_nolink"));

    Ok(())
}

#[tokio::test]
async fn test_canceled_payment_stays_pending() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/payments/tr_cancel");
        then.status(200)
            .json_body(json!({"id": "tr_cancel", "status": "canceled"}));
    });

    let adapter = build_adapter(&server).await?;
    adapter
        .store()
        .set_transaction_id("order-1001", "tr_cancel")
        .await?;

    let err = adapter
        .confirm(&CallbackParams::from_query("payment_id=order-1001"), &config())
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Unexpected provider status for payment order-1001: canceled"
    );
    assert!(!adapter.store().find("order-1001").await?.unwrap().is_paid());

    Ok(())
}

#[tokio::test]
async fn test_provider_error_on_status_fetch() -> Result<()> {
    let server = MockServer::start();
    let status_mock = server.mock(|when, then| {
        when.method(GET).path("/v2/payments/tr_broken");
        then.status(503).body("upstream unavailable");
    });

    let adapter = build_adapter(&server).await?;
    adapter
        .store()
        .set_transaction_id("order-1001", "tr_broken")
        .await?;

    let err = adapter
        .confirm(&CallbackParams::from_query("payment_id=order-1001"), &config())
        .await
        .unwrap_err();

    status_mock.assert();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        GatewayError::ProviderRequest { status: Some(503), ref detail, .. } if detail == "upstream unavailable"
    ));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_concurrent_callbacks_complete_once() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v2/payments/tr_dup");
        then.status(200)
            .json_body(json!({"id": "tr_dup", "status": "paid"}));
    });

    let client = MollieClient::new(server.base_url(), Duration::from_secs(5))?;
    let store = CountingStore::default();
    store.insert(record()).await?;
    store.set_transaction_id("order-1001", "tr_dup").await?;
    let adapter = GatewayAdapter::new(client, store.clone());

    let params = CallbackParams::from_query("payment_id=order-1001");
    let config = config();
    let (first, second) = tokio::join!(
        adapter.confirm(&params, &config),
        adapter.confirm(&params, &config)
    );

    assert_eq!(first?.url, "https://shop.test/checkout/success");
    assert_eq!(second?.url, "https://shop.test/checkout/success");
    assert_eq!(store.completions.load(Ordering::SeqCst), 1);

    let completed = store.find("order-1001").await?.unwrap();
    assert!(completed.is_paid());
    assert_eq!(completed.transaction_id.as_deref(), Some("tr_dup"));

    // 之後的 callback 不會改動已完成的紀錄
    adapter.confirm(&params, &config).await?;
    let after = store.find("order-1001").await?.unwrap();
    assert_eq!(after.completed_at, completed.completed_at);
    assert_eq!(after.provider_payload, completed.provider_payload);
    assert_eq!(store.completions.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_initiate_unknown_record_creates_nothing() -> Result<()> {
    let server = MockServer::start();
    let create_mock = server.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(201).json_body(json!({
            "id": "tr_orphan",
            "status": "open",
            "_links": {"checkout": {"href": "https://www.mollie.com/checkout/tr_orphan"}}
        }));
    });

    let client = MollieClient::new(server.base_url(), Duration::from_secs(5))?;
    let adapter = GatewayAdapter::new(client, InMemoryPaymentStore::new());

    let err = adapter.initiate(&record(), &config()).await.unwrap_err();

    assert!(matches!(err, GatewayError::PaymentNotFound { .. }));
    create_mock.assert_hits(0);

    Ok(())
}

#[tokio::test]
async fn test_initiate_after_completion_keeps_original_payment() -> Result<()> {
    let server = MockServer::start();
    let create_mock = server.mock(|when, then| {
        when.method(POST).path("/v2/payments");
        then.status(201).json_body(json!({
            "id": "tr_second",
            "status": "open",
            "_links": {"checkout": {"href": "https://www.mollie.com/checkout/tr_second"}}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/v2/payments/tr_first");
        then.status(200)
            .json_body(json!({"id": "tr_first", "status": "paid"}));
    });

    let adapter = build_adapter(&server).await?;
    adapter
        .store()
        .set_transaction_id("order-1001", "tr_first")
        .await?;
    adapter
        .confirm(&CallbackParams::from_query("payment_id=order-1001"), &config())
        .await?;

    let again = adapter.initiate(&record(), &config()).await?;

    assert_eq!(again.kind, RedirectKind::Success);
    assert_eq!(again.url, "https://shop.test/checkout/success");
    create_mock.assert_hits(0);
    let stored = adapter.store().find("order-1001").await?.unwrap();
    assert_eq!(stored.transaction_id.as_deref(), Some("tr_first"));
    assert!(stored.is_paid());

    Ok(())
}
