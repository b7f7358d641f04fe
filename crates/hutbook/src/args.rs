use clap::{Parser, Subcommand};
use hutbook_engine::attempt::SubmitGate;
use hutbook_engine::config::request_file::RetryOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hutbook",
    version,
    about = "Book mountain huts on hut-reservation.org"
)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,

    /// Booking request file (YAML). Repeat to book several huts at once.
    #[arg(short, long = "config", required = true)]
    pub configs: Vec<PathBuf>,

    /// Stop on the summary page without submitting.
    #[arg(long)]
    pub dry_run: bool,

    /// Actually submit the reservation. Without it the run stops at the summary.
    #[arg(long, conflicts_with = "dry_run")]
    pub confirm_submit: bool,

    /// Where step screenshots go (overrides the engine config).
    #[arg(long)]
    pub screenshot_dir: Option<PathBuf>,

    #[arg(long)]
    pub no_screenshots: bool,

    /// Keep retrying while the hut is full.
    #[arg(long)]
    pub poll: bool,

    #[arg(long)]
    pub interval_seconds: Option<i64>,

    #[arg(long)]
    pub jitter_seconds: Option<i64>,

    /// 0 retries forever.
    #[arg(long)]
    pub max_attempts: Option<i64>,

    #[arg(long)]
    pub allow_alternative_dates: bool,

    #[arg(long)]
    pub allow_waitlist: bool,

    /// Engine settings file; defaults to ./hutbook.yaml or ~/.hutbook/config.yaml.
    #[arg(long)]
    pub engine_config: Option<PathBuf>,

    /// Print the final reports as JSON.
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Use a local Chromium via CDP
    Headless {
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
    },
    /// Use an external WebDriver server (chromedriver)
    Embedded {
        #[arg(long, default_value = hutbook_e::webdriver::DEFAULT_WEBDRIVER_URL)]
        driver_url: String,

        #[arg(long)]
        visible: bool,
    },
}

impl Args {
    pub fn overrides(&self) -> RetryOverrides {
        RetryOverrides {
            poll: self.poll,
            interval_seconds: self.interval_seconds,
            jitter_seconds: self.jitter_seconds,
            max_attempts: self.max_attempts,
            allow_alternative_dates: self.allow_alternative_dates,
            allow_waitlist: self.allow_waitlist,
        }
    }

    pub fn gate(&self) -> SubmitGate {
        SubmitGate {
            dry_run: self.dry_run,
            confirm_submit: self.confirm_submit,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
