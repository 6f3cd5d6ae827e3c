// inkmark-replay: replay a scripted annotation session and print the result as JSON.
//
// Usage: inkmark-replay <script.replay.json> [config.inkmark.json]
// Log level comes from RUST_LOG (default: info). Logs go to stderr.

use anyhow::{bail, Context};
use inkmark_history::{load_config, HistoryConfig};
use inkmark_ui::replay::{load_script, replay};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        bail!("usage: inkmark-replay <script.replay.json> [config.inkmark.json]");
    };

    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => HistoryConfig::default(),
    };
    info!(?config, "Using history config");

    let script = load_script(&script_path)?;
    let report = replay(&script, config)?;

    let json = serde_json::to_string_pretty(&report).context("serialize replay report")?;
    println!("{}", json);
    Ok(())
}
