use clap::Parser;
use crm_console::cli::utils::report_error;
use crm_console::cli::{Cli, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_format = OutputFormat::from_cli(&cli);

    if let Err(e) = crm_console::cli::run(cli).await {
        let verbose = matches!(std::env::var("CLI_VERBOSE").as_deref(), Ok("true") | Ok("1"));
        report_error(output_format, &e, verbose)?;
        std::process::exit(1);
    }

    Ok(())
}
