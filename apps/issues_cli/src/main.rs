use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use client_core::{
    render_page, ApiTransport, ControllerError, HttpTransport, IndicatorRegistry,
    LogNotifications, NotificationSink, ProcessingIssuesController,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod watch;

use render::{render_text, ONE_SHOT_HINTS};

#[derive(Parser, Debug)]
#[command(
    name = "processing-issues",
    about = "Inspect and resolve event processing issues for a project"
)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    org: Option<String>,
    #[arg(long)]
    project: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Fetch and print the processing issues page.
    Show,
    /// Trigger reprocessing of pending events, then print the refreshed page.
    Reprocess,
    /// Keep the page open and act on commands read from stdin.
    Watch,
}

impl Cli {
    fn apply_to(&self, settings: &mut config::Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = &self.org {
            settings.org = Some(v.clone());
        }
        if let Some(v) = &self.project {
            settings.project = Some(v.clone());
        }
        if let Some(v) = &self.token {
            settings.auth_token = Some(v.clone());
        }
    }
}

type Controller<T> = ProcessingIssuesController<T, Arc<dyn NotificationSink>>;

fn print_page(view: &client_core::ViewState) {
    println!(
        "{}",
        render_text(&render_page(view), Utc::now(), ONE_SHOT_HINTS)
    );
}

async fn show<T: ApiTransport>(controller: &Controller<T>) -> Result<()> {
    let result = controller.fetch_issues().await;
    print_page(&controller.snapshot().await);
    result.with_context(|| format!("failed to load processing issues for {}", controller.project()))
}

async fn reprocess<T: ApiTransport>(controller: &Controller<T>) -> Result<()> {
    controller
        .fetch_issues()
        .await
        .with_context(|| format!("failed to load processing issues for {}", controller.project()))?;

    match controller.trigger_reprocessing().await {
        Ok(()) => {
            info!(project = %controller.project(), "reprocessing started");
            print_page(&controller.snapshot().await);
            Ok(())
        }
        Err(ControllerError::NothingToReprocess) => {
            print_page(&controller.snapshot().await);
            println!("Nothing to reprocess.");
            Ok(())
        }
        Err(err) => {
            print_page(&controller.snapshot().await);
            Err(err).context("reprocessing did not complete")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings(cli.config.as_deref())?;
    cli.apply_to(&mut settings);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let project = settings.project_ref()?;
    let transport =
        HttpTransport::new(settings.transport_config()).context("failed to set up http client")?;
    info!(api = transport.api_root(), %project, "using processing issues api");

    let indicators = Arc::new(IndicatorRegistry::new());
    let notifications: Arc<dyn NotificationSink> = match cli.command {
        Command::Watch => indicators.clone(),
        Command::Show | Command::Reprocess => Arc::new(LogNotifications::default()),
    };
    let controller = ProcessingIssuesController::new(
        transport,
        notifications,
        project,
        settings.controller_settings(),
    );

    let outcome = match cli.command {
        Command::Show => show(&controller).await,
        Command::Reprocess => reprocess(&controller).await,
        Command::Watch => watch::run(&controller, &indicators).await,
    };

    controller.teardown().await;
    outcome
}
