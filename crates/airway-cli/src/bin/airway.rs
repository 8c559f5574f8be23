use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airway_cli::{run, Cli};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("airway_core=warn".parse()?))
        .init();

    let cli = Cli::parse();
    let report = run(&cli)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
