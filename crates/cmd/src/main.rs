mod trigger;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::trigger::TriggerArgs;

#[derive(Parser)]
#[command(name = "janky-trigger")]
#[command(about = "Trigger a Janky build and wait for it to finish")]
struct Cli {
    #[command(flatten)]
    trigger: TriggerArgs,

    /// Log debug output
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    trigger::execute(&cli.trigger).await
}

fn setup_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
