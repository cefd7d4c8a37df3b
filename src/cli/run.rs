//! Launch pipeline: resolve socket, fetch files, start server

use crate::cache::{Fetcher, RemoteCopier};
use crate::cli::args::Cli;
use crate::config::LaunchSettings;
use crate::error::{LaunchError, LaunchResult};
use crate::launch::{LaunchCommand, LaunchOutcome, ProcessLauncher};
use crate::resolver::{CollectionSet, SocketConfigClient};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Execute the launch pipeline for `args.socket`
pub async fn execute(
    args: &Cli,
    settings: &LaunchSettings,
    copier: Box<dyn RemoteCopier>,
    launcher: &dyn ProcessLauncher,
) -> LaunchResult<()> {
    let socket = args
        .socket
        .as_deref()
        .ok_or_else(|| LaunchError::User("no socket given".to_string()))?;

    println!("Looking up config for {}", style(socket).cyan());

    let client = SocketConfigClient::new(&settings.base_url, &settings.strip_prefix)
        .with_timeout(settings.timeout);
    debug!("Config URL: {}", client.url_for(socket));

    let pb = create_progress_bar("Fetching socket config...");
    let resolved = client.resolve(socket).await;
    pb.finish_and_clear();

    launch_collections(&resolved?, args, settings, copier, launcher).await
}

/// Fetch `collections` into the cache and print or run the server command
pub async fn launch_collections(
    collections: &CollectionSet,
    args: &Cli,
    settings: &LaunchSettings,
    copier: Box<dyn RemoteCopier>,
    launcher: &dyn ProcessLauncher,
) -> LaunchResult<()> {
    if collections.is_empty() {
        warn!("Socket config lists no collections");
    }

    let keys: Vec<&str> = collections.keys().collect();
    println!("Configured to serve:\n\t{}\n", keys.join("\n\t"));

    println!("Fetching files...");
    let fetcher = Fetcher::new(&settings.cache_dir, copier).verbose(args.is_verbose());
    let downloaded = fetcher.fetch_all(collections).await?;

    let command = LaunchCommand::build(
        &settings.binary,
        settings.mlock,
        &args.server_args,
        &downloaded,
    );

    if args.is_verbose() {
        println!("{}", command);
    }

    println!("\n");

    if !args.run {
        println!(
            "{} To start server, re-run with --run.",
            style("DRY RUN.").yellow().bold()
        );
        return Ok(());
    }

    println!("Starting {}", style(&settings.binary).cyan());
    match launcher.launch(&command).await? {
        LaunchOutcome::Exited => info!("{} exited", settings.binary),
        LaunchOutcome::Interrupted => info!("{} interrupted", settings.binary),
    }

    Ok(())
}

fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
