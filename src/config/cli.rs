use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mollie-checkout")]
#[command(about = "Create and confirm Mollie hosted-checkout payments")]
pub struct CliConfig {
    #[arg(long, short, default_value = "gateway.toml")]
    pub config: PathBuf,

    #[arg(long, help = "Override the payment store path from the config file")]
    pub store: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a payment record (JSON file) to the store
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Create the provider payment and print the checkout URL
    Create {
        #[arg(long)]
        payment_id: String,
    },
    /// Check the provider status and complete the payment
    Confirm {
        #[arg(long, conflicts_with = "query", required_unless_present = "query")]
        payment_id: Option<String>,

        /// Raw callback query string, e.g. "payment_id=42"
        #[arg(long)]
        query: Option<String>,
    },
}

impl Command {
    pub fn callback_query(&self) -> Option<String> {
        match self {
            Command::Confirm {
                payment_id: Some(id),
                ..
            } => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("payment_id", id)
                    .finish(),
            ),
            Command::Confirm { query, .. } => query.clone(),
            _ => None,
        }
    }
}
