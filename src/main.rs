// Entrypoint for the CLI application.
// - Keeps `main` small: read configuration, set up logging and hand off to
//   the UI loop.
// - Returns `anyhow::Result` so glue failures surface with context.

use gdrive_cli::{config::Config, ui};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Logs go to stderr so they never mix with listing output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    // Blocks until the user quits.
    ui::run(config)?;
    Ok(())
}
