//! Run one named Photoshop tool through the bridge.
//!
//! Run with: cargo run -p ps-call -- <tool> ['<json args>']
//!
//! `cargo run -p ps-call -- --list` prints the catalogue. Connection
//! settings come from `PSBRIDGE_APP`, `PSBRIDGE_ENDPOINT` and
//! `PSBRIDGE_TIMEOUT_SECS`.

use anyhow::{Context, Result, bail};
use psbridge_core::{Session, session};
use psbridge_ops::{ToolCall, catalog};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the result.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(name) = args.next() else {
        bail!("usage: ps-call <tool> ['<json args>'] | --list");
    };

    if name == "--list" {
        println!("{}", serde_json::to_string_pretty(catalog())?);
        return Ok(());
    }

    let tool_args: Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw).context("arguments must be a JSON object")?,
        None => Value::Null,
    };

    session::configure(Session::from_env()?)?;
    let bridge = psbridge_session::global()?;

    let call = ToolCall::from_tool_call(&name, &tool_args)?;
    tracing::info!("Running {name}");
    let output = call.execute(bridge).await?;

    println!("{}", serde_json::to_string_pretty(&output.to_json())?);
    Ok(())
}
