use anyhow::Result;
use feedbot::api::rest::AppClient;
use feedbot::api::storage::PresignedStore;
use feedbot::config::Config;
use feedbot::engagement::EngagementController;
use feedbot::posting::image::PicsumSource;
use feedbot::posting::PostController;
use feedbot::scheduler::{self, Controller, StopReason};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: feedbot <engage|post> [--config <path>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Engage,
    Post,
}

fn parse_args(args: &[String]) -> Result<(Mode, PathBuf)> {
    let mut mode = None;
    let mut config_path = PathBuf::from("config.toml");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "engage" => mode = Some(Mode::Engage),
            "post" => mode = Some(Mode::Post),
            "--config" => match iter.next() {
                Some(p) => config_path = PathBuf::from(p),
                None => anyhow::bail!("--config needs a path\n{}", USAGE),
            },
            other => anyhow::bail!("unknown argument: {}\n{}", other, USAGE),
        }
    }
    match mode {
        Some(m) => Ok((m, config_path)),
        None => anyhow::bail!("{}", USAGE),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedbot=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, config_path) = parse_args(&args)?;

    let config = Config::load_or_default(Path::new(&config_path))?;
    config.validate()?;

    let api = Arc::new(AppClient::new(&config.api));
    let timeout = Duration::from_millis(config.api.request_timeout_ms);

    // Ctrl-C flips the token; the scheduler and the engagement post loop watch it.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            signal_token.cancel();
        }
    });

    println!();
    let mut controller: Box<dyn Controller> = match mode {
        Mode::Engage => {
            println!("  Engagement bot starting");
            println!("  =======================");
            println!("  Server: {}", api.base_url());
            println!("  Interval: {}s", config.engagement.cycle_interval_s);
            println!();
            Box::new(
                EngagementController::start(api, config.engagement, StdRng::from_entropy())
                    .await?
                    .with_cancellation(cancel.clone()),
            )
        }
        Mode::Post => {
            println!("  Post bot starting");
            println!("  =================");
            println!("  Server: {}", api.base_url());
            println!("  Account: {}", config.posting.account.username);
            println!("  Interval: {}s", config.posting.interval_s);
            println!();
            let base_url = api.base_url().to_string();
            let store = Arc::new(PresignedStore::new(timeout));
            let images = Arc::new(PicsumSource::new(
                &config.posting.image_provider_url,
                config.posting.image_width,
                config.posting.image_height,
                timeout,
            ));
            Box::new(
                PostController::start(api, store, images, config.posting, &base_url, StdRng::from_entropy())
                    .await?,
            )
        }
    };

    let summary = scheduler::run(controller.as_mut(), &cancel).await;
    println!();
    println!("  {}", summary);

    match summary.stop {
        StopReason::Cancelled => Ok(()),
        StopReason::Failed(reason) => anyhow::bail!(reason),
    }
}
