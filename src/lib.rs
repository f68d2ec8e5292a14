pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{InMemoryPaymentStore, JsonFileStore, MollieClient};
pub use crate::config::{GatewayConfig, StaticConfig};
pub use crate::core::gateway::{CallbackParams, GatewayAdapter, RedirectMode};
pub use crate::core::{PaymentRecord, RedirectKind, RedirectTarget};
pub use crate::utils::error::{GatewayError, Result};
