//! keyrate CLI - paces key/value lines and prints values as they are released.
//!
//! ```text
//! keyrate [FILE]      # reads stdin when FILE is omitted
//! ```
//!
//! Each input line is `key<TAB>value`. Values sharing a key are printed at
//! least one pacing interval apart; values under different keys are printed
//! as soon as their own group allows. Logs go to stderr so stdout carries
//! only values.

mod input;

use anyhow::{Context, Result};
use std::{
    env,
    fs::File,
    io::{self, BufReader, ErrorKind, Write},
    path::PathBuf,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use keyrate_config::KeyRateConfig;
use keyrate_engine::Pacer;

fn init_tracing(config_filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = KeyRateConfig::load_with_env();
    init_tracing(
        config
            .as_ref()
            .ok()
            .and_then(KeyRateConfig::log_filter),
    );
    let config = config.context("failed to load configuration")?;

    let items = match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            input::read_items(BufReader::new(file))
        }
        None => input::read_items(io::stdin().lock()),
    }?;

    let pacer = Pacer::new(config.key_rate(), config.pacer_settings()?);
    tracing::info!(
        items = items.len(),
        interval_ms = pacer.key_rate().get().as_millis(),
        "Pacing input"
    );

    let mut run = pacer.spawn(items);
    let mut stdout = io::stdout();
    while let Some(value) = run.stream.recv().await {
        match writeln!(stdout, "{value}").and_then(|()| stdout.flush()) {
            Ok(()) => {}
            // Reader went away (e.g. `| head`); dropping the stream stops the run.
            Err(e) if e.kind() == ErrorKind::BrokenPipe => break,
            Err(e) => return Err(e).context("failed to write output"),
        }
    }
    drop(run.stream);

    let summary = run.completion.wait().await?;
    tracing::info!(
        groups = summary.groups,
        emitted = summary.emitted,
        abandoned = summary.abandoned,
        failed = summary.failed,
        "Run finished"
    );
    Ok(())
}
