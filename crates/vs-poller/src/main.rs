//! VS Poller CLI
//!
//! Validates request fragments and waits for vector store resources to settle.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vs_gateway_core::config::GatewayConfig;
use vs_gateway_core::prelude::*;
use vs_poller::{
    wait_for_file_batch, wait_for_vector_store, wait_for_vector_store_files, PollOptions,
    ProviderClient,
};

#[derive(Parser, Debug)]
#[command(name = "vs-poller")]
#[command(about = "Constraint validator and resource poller for the vector store gateway")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "VS_GATEWAY_CONFIG")]
    config: Option<String>,

    /// Provider API key (overrides config)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Provider base URL (overrides config)
    #[arg(long, env = "PROVIDER_BASE_URL")]
    base_url: Option<String>,

    /// Log level (overrides config)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a JSON fragment against the request constraints
    Validate {
        #[arg(value_enum)]
        field: Field,

        /// JSON document to check
        json: String,
    },

    /// Poll a resource until it reaches a terminal status
    Wait {
        /// Deadline in milliseconds (defaults to poller.max_wait)
        #[arg(long)]
        max_wait_ms: Option<u64>,

        #[command(subcommand)]
        target: WaitTarget,
    },

    /// Check that the provider is reachable
    Health,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Field {
    Filter,
    Chunking,
    Metadata,
}

#[derive(Subcommand, Debug)]
enum WaitTarget {
    /// A vector store
    VectorStore { vector_store_id: String },

    /// One or more files inside a vector store
    File {
        vector_store_id: String,
        #[arg(required = true)]
        file_ids: Vec<String>,
    },

    /// A file batch
    Batch {
        vector_store_id: String,
        batch_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = GatewayConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(key) = args.api_key {
        config.provider.api_key = Some(key);
    }
    if let Some(url) = args.base_url {
        config.provider.base_url = url;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }

    init_tracing(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting vs-poller");

    match args.command {
        Command::Validate { field, json } => validate(&config, field, &json),
        Command::Wait { max_wait_ms, target } => {
            let options = PollOptions::from_config(&config.poller)
                .with_max_wait_opt(max_wait_ms.map(Duration::from_millis));
            wait(&config, target, &options).await
        }
        Command::Health => {
            let client = ProviderClient::new(&config.provider)?;
            if let Err(e) = client.health_check().await {
                error!(error = %e, component = client.component_name(), "Health check failed");
                return Err(e.into());
            }
            println!("ok");
            Ok(())
        }
    }
}

/// JSON logs by default; `pretty` for local runs. Logs go to stderr.
fn init_tracing(config: &GatewayConfig) {
    let json = config.observability.log_format != "pretty";
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().pretty().with_writer(std::io::stderr)))
        .with(filter)
        .init();
}

fn validate(config: &GatewayConfig, field: Field, raw: &str) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(raw).context("argument is not valid JSON")?;
    let validator = ConstraintValidator::with_limits(config.limits);

    let (valid, message) = match field {
        Field::Filter => (
            validator.validate_filter(&value),
            validator.explain_filter(&value),
        ),
        Field::Chunking => (
            validator.validate_chunking(Some(&value)),
            validator.explain_chunking(Some(&value)),
        ),
        Field::Metadata => (
            validator.validate_metadata(Some(&value)),
            validator.explain_metadata(Some(&value)),
        ),
    };

    if !valid {
        bail!(message);
    }
    println!("valid");
    Ok(())
}

async fn wait(config: &GatewayConfig, target: WaitTarget, options: &PollOptions) -> anyhow::Result<()> {
    let client = ProviderClient::new(&config.provider)?;

    let rendered = match target {
        WaitTarget::VectorStore { vector_store_id } => {
            serde_json::to_string_pretty(&wait_for_vector_store(&client, &vector_store_id, options).await?)?
        }
        WaitTarget::File {
            vector_store_id,
            file_ids,
        } => serde_json::to_string_pretty(
            &wait_for_vector_store_files(&client, &vector_store_id, &file_ids, options).await?,
        )?,
        WaitTarget::Batch {
            vector_store_id,
            batch_id,
        } => serde_json::to_string_pretty(
            &wait_for_file_batch(&client, &vector_store_id, &batch_id, options).await?,
        )?,
    };

    println!("{rendered}");
    Ok(())
}
