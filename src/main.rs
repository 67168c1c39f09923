use anyhow::Result;
use clap::Parser;
use subtally::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    subtally::init_tracing(level, &config.server.log_format);

    cli.run(config).await
}
