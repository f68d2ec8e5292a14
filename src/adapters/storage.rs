use crate::core::{CompletionOutcome, PaymentRecord, PaymentRecordStore};
use crate::utils::error::{GatewayError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

type Records = HashMap<String, PaymentRecord>;

fn not_found(payment_id: &str) -> GatewayError {
    GatewayError::PaymentNotFound {
        payment_id: payment_id.to_string(),
    }
}

fn set_transaction_id(records: &mut Records, payment_id: &str, transaction_id: &str) -> Result<()> {
    let record = records
        .get_mut(payment_id)
        .ok_or_else(|| not_found(payment_id))?;
    if !record.update_transaction_id(transaction_id) {
        return Err(GatewayError::PaymentAlreadyCompleted {
            payment_id: payment_id.to_string(),
        });
    }
    Ok(())
}

fn complete_if_pending(
    records: &mut Records,
    payment_id: &str,
    provider_id: &str,
    payload: serde_json::Value,
) -> Result<CompletionOutcome> {
    let record = records
        .get_mut(payment_id)
        .ok_or_else(|| not_found(payment_id))?;
    if record.completed(provider_id, payload) {
        Ok(CompletionOutcome::Completed)
    } else {
        Ok(CompletionOutcome::AlreadyCompleted)
    }
}

/// 記憶體內的付款紀錄，clone 之後共用同一份資料
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    records: Arc<Mutex<Records>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentRecordStore for InMemoryPaymentStore {
    async fn find(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        let records = self.records.lock().await;
        Ok(records.get(payment_id).cloned())
    }

    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn set_transaction_id(&self, payment_id: &str, transaction_id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        set_transaction_id(&mut records, payment_id, transaction_id)
    }

    async fn complete_if_pending(
        &self,
        payment_id: &str,
        provider_id: &str,
        payload: serde_json::Value,
    ) -> Result<CompletionOutcome> {
        let mut records = self.records.lock().await;
        complete_if_pending(&mut records, payment_id, provider_id, payload)
    }
}

/// 以單一 JSON 檔案 `{ "<id>": record }` 保存付款紀錄。
///
/// 每次操作都在 mutex 內讀取並寫回整個檔案，同一個 process 內的 compare-and-set
/// 因此是原子的；跨 process 的寫入需要外部序列化。
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Records> {
        if !self.path.exists() {
            return Ok(Records::new());
        }
        let data = fs::read(&self.path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Records::new());
        }
        serde_json::from_slice(&data).map_err(|e| GatewayError::Storage {
            message: format!("{} is not a valid payment store: {}", self.path.display(), e),
        })
    }

    fn persist(&self, records: &Records) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // 先寫入暫存檔再 rename，避免寫到一半的檔案
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("Persisted {} payment records to {}", records.len(), self.path.display());
        Ok(())
    }
}

impl PaymentRecordStore for JsonFileStore {
    async fn find(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        let _guard = self.lock.lock().await;
        let mut records = self.load()?;
        Ok(records.remove(payment_id))
    }

    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load()?;
        records.insert(record.id.clone(), record);
        self.persist(&records)
    }

    async fn set_transaction_id(&self, payment_id: &str, transaction_id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load()?;
        set_transaction_id(&mut records, payment_id, transaction_id)?;
        self.persist(&records)
    }

    async fn complete_if_pending(
        &self,
        payment_id: &str,
        provider_id: &str,
        payload: serde_json::Value,
    ) -> Result<CompletionOutcome> {
        let _guard = self.lock.lock().await;
        let mut records = self.load()?;
        let outcome = complete_if_pending(&mut records, payment_id, provider_id, payload)?;
        if outcome == CompletionOutcome::Completed {
            self.persist(&records)?;
        }
        Ok(outcome)
    }
}
