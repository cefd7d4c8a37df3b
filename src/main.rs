//! thile-launch CLI entry point

use clap::Parser;
use console::style;
use std::process::ExitCode;
use thile_launch::cache::HadoopCopier;
use thile_launch::cli::Cli;
use thile_launch::config::ConfigFile;
use thile_launch::error::LaunchResult;
use thile_launch::launch::NativeLauncher;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> LaunchResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("thile_launch=warn"),
        1 => EnvFilter::new("thile_launch=info"),
        _ => EnvFilter::new("thile_launch=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config_file = ConfigFile::new(cli.config.clone());

    if cli.write_config {
        config_file.write_default().await?;
        println!("{}", config_file.path().display());
        return Ok(());
    }

    let config = config_file.load().await?;
    let settings = cli.settings(&config);

    let copier = HadoopCopier::new(&settings.copy_tool);
    thile_launch::cli::execute(&cli, &settings, Box::new(copier), &NativeLauncher::new()).await
}
