mod terminal;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use forgeyt_core::config::Config;
use forgeyt_core::dependency::{locate_downloader, DOWNLOADER_BINARY};
use forgeyt_core::logging::LogManager;
use forgeyt_core::{
    CommandBuilder, FormatRegistry, ProcessSupervisor, Session, SessionOutcome, VersionChecker,
    VersionStatus, WebhookReporter, CURRENT_VERSION,
};
use terminal::StdioTerminal;
use tracing::{info, warn};
use url::Url;

const ISSUE_HINT: &str = "If you are experiencing issues, type 'issue' in the YT Url section.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let (config, config_path) =
        Config::load_or_default(None).context("failed to load configuration")?;
    let log_manager = LogManager::init(&config.logging).context("failed to set up logging")?;
    info!(?config_path, version = CURRENT_VERSION, "forgeyt starting");

    let client = reqwest::Client::new();

    if config.updates.check_on_startup {
        let checker = VersionChecker::new(client.clone(), config.updates.version_url.clone());
        let status = checker.check(CURRENT_VERSION).await;
        println!("{}", version_notice(&status, &config.updates.download_url));
    }
    print_banner();

    let program = locate_downloader(&config.advanced).unwrap_or_else(|error| {
        warn!(%error, "falling back to {DOWNLOADER_BINARY} on PATH");
        PathBuf::from(DOWNLOADER_BINARY)
    });

    let registry = FormatRegistry::new();
    let mut session = Session::new(
        StdioTerminal::stdio(),
        &registry,
        CommandBuilder::from_config(&config),
        WebhookReporter::new(client, &config.issues),
        ProcessSupervisor::new(program),
    );

    match session.run().await.context("interactive session failed")? {
        SessionOutcome::Dispatched(completion) => {
            info!(exit_code = ?completion.exit_code, "download attempt over, exiting");
            // Let anything already queued reach the terminal first.
            tokio::task::yield_now().await;
            std::io::stdout().flush().ok();
            drop(log_manager);
            std::process::exit(completion.host_exit_code());
        }
        SessionOutcome::InputClosed => Ok(()),
    }
}

fn version_notice(status: &VersionStatus, download_url: &Url) -> String {
    match status {
        VersionStatus::UpToDate => "Version check: Up to date".to_string(),
        VersionStatus::UpdateAvailable { .. } => format!(
            "ForgeYT Has an update! Please Install the Latest Version from {download_url}"
        ),
        VersionStatus::Unavailable(reason) => format!("Version check failed: {reason}"),
    }
}

fn print_banner() {
    println!();
    println!("     ForgeYT {CURRENT_VERSION}");
    println!();
    println!("{ISSUE_HINT}");
}
