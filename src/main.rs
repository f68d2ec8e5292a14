use anyhow::Context;
use clap::Parser;
use mollie_checkout::config::cli::Command;
use mollie_checkout::core::PaymentRecordStore;
use mollie_checkout::utils::error::ErrorSeverity;
use mollie_checkout::utils::{logger, validation::Validate};
use mollie_checkout::{
    CallbackParams, CliConfig, GatewayAdapter, GatewayConfig, GatewayError, JsonFileStore,
    MollieClient, PaymentRecord,
};

fn store_for(cli: &CliConfig, config: &GatewayConfig) -> JsonFileStore {
    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config.store_path().into());
    JsonFileStore::new(store_path)
}

fn build_adapter(
    cli: &CliConfig,
    config: &GatewayConfig,
) -> mollie_checkout::Result<GatewayAdapter<MollieClient, JsonFileStore>> {
    let client = MollieClient::new(config.base_url(), config.timeout())?;
    Ok(GatewayAdapter::new(client, store_for(cli, config)))
}

async fn create(
    cli: &CliConfig,
    config: &GatewayConfig,
    payment_id: &str,
) -> mollie_checkout::Result<String> {
    let adapter = build_adapter(cli, config)?;
    let record = adapter
        .store()
        .find(payment_id)
        .await?
        .ok_or_else(|| GatewayError::PaymentNotFound {
            payment_id: payment_id.to_string(),
        })?;
    let target = adapter.initiate(&record, config).await?;
    Ok(target.url)
}

async fn confirm(cli: &CliConfig, config: &GatewayConfig) -> mollie_checkout::Result<String> {
    let adapter = build_adapter(cli, config)?;
    let query = cli.command.callback_query().unwrap_or_default();
    let target = adapter
        .confirm(&CallbackParams::from_query(&query), config)
        .await?;
    Ok(target.url)
}

async fn import(
    cli: &CliConfig,
    config: &GatewayConfig,
    file: &std::path::Path,
) -> anyhow::Result<String> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("reading payment record {}", file.display()))?;
    let record: PaymentRecord =
        serde_json::from_str(&data).context("payment record is not valid JSON")?;

    let store = store_for(cli, config);
    let id = record.id.clone();
    store.insert(record).await?;
    Ok(id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match GatewayConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_service_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }
    tracing::info!("Starting mollie-checkout against {}", config.base_url());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(3);
    }

    let outcome = match &cli.command {
        Command::Import { file } => {
            let id = import(&cli, &config, file).await?;
            println!("📥 Imported payment {}", id);
            return Ok(());
        }
        Command::Create { payment_id } => create(&cli, &config, payment_id).await,
        Command::Confirm { .. } => confirm(&cli, &config).await,
    };

    match outcome {
        Ok(url) => {
            tracing::info!("➡️ Redirect to {}", url);
            println!("{}", url);
        }
        Err(e) => {
            tracing::error!(
                "❌ Gateway operation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
