mod args;
mod report;

use anyhow::Context;
use args::{Args, Mode};
use clap::Parser;
use hutbook_e::backend::EmbeddedBackend;
use hutbook_engine::attempt::BrowserAttemptRunner;
use hutbook_engine::backend::BackendFactory;
use hutbook_engine::config::{ConfigLoader, EngineConfig, RequestLoader};
use hutbook_engine::credentials::Credentials;
use hutbook_engine::request::BookingRequest;
use hutbook_engine::schedule::{MultiRequestCoordinator, RequestReport, RetryScheduler};
use hutbook_engine::screenshots::{DirectorySink, NullSink, ScreenshotSink};
use hutbook_h::backend::HeadlessBackend;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the final report.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let overrides = args.overrides();
    let mut requests = Vec::new();
    for path in &args.configs {
        let loaded = RequestLoader::load_from(path, &overrides)
            .await
            .with_context(|| format!("Invalid booking request {}", path.display()))?;
        requests.extend(loaded);
    }

    let mut config = match &args.engine_config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Invalid engine config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    if let Some(dir) = &args.screenshot_dir {
        config.screenshots.dir = dir.clone();
    }
    if args.no_screenshots {
        config.screenshots.enabled = false;
    }

    let credentials = Credentials::from_env()?;
    info!(
        "Loaded {} booking request(s) for {}",
        requests.len(),
        credentials.username
    );

    let reports = match args.mode.clone() {
        Mode::Headless { visible } => {
            let factory = move || HeadlessBackend::new_with_visibility(visible);
            run(factory, &args, config, credentials, &requests).await?
        }
        Mode::Embedded {
            driver_url,
            visible,
        } => {
            let factory = move || EmbeddedBackend::with_url(driver_url.clone()).visible(visible);
            run(factory, &args, config, credentials, &requests).await?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print!("{}", report::render(&reports));
    }

    Ok(report::exit_code(&reports))
}

fn screenshot_sink(config: &EngineConfig, requests: &[BookingRequest]) -> Box<dyn ScreenshotSink> {
    if !config.screenshots.enabled {
        return Box::new(NullSink);
    }
    let polling = requests.iter().any(BookingRequest::polls);
    Box::new(DirectorySink::new(config.screenshots.dir.clone()).per_attempt(polling))
}

async fn run<F: BackendFactory>(
    factory: F,
    args: &Args,
    config: EngineConfig,
    credentials: Credentials,
    requests: &[BookingRequest],
) -> anyhow::Result<Vec<RequestReport>> {
    let sink = screenshot_sink(&config, requests);
    let runner = BrowserAttemptRunner::new(factory, config, credentials, args.gate(), sink);
    let mut coordinator = MultiRequestCoordinator::new(RetryScheduler::new(runner));
    Ok(coordinator.run(requests).await?)
}
