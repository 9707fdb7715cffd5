//! Frontpage Poster - native host
//!
//! Reads one JSON command per line on stdin and writes one JSON reply per
//! line on stdout. Logs go to stderr.

use anyhow::Context;
use frontpage_core::{host, Config, Frontpage};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    frontpage_core::init_logging();

    let config = Config::from_env().context("invalid configuration")?;
    let app = Frontpage::new(config).context("failed to initialize poster state")?;

    tracing::info!(
        database = %app.config().database_path.display(),
        "Frontpage host started"
    );

    host::serve(&app, BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("host loop failed")?;

    Ok(())
}
