pub mod amount;
pub mod gateway;

pub use crate::domain::model::{
    Amount, CompletionOutcome, CreatePaymentRequest, PaymentMetadata, PaymentRecord,
    ProviderPayment, ProviderStatus, RecordStatus, RedirectKind, RedirectTarget,
};
pub use crate::domain::ports::{GatewayConfigProvider, PaymentProvider, PaymentRecordStore};
pub use crate::utils::error::Result;
