//! SureBank Watch - payment confirmation from the terminal
//!
//! Architecture:
//! - Host thread - reads lifecycle events (`resume` or a deep link) from stdin
//! - Platform Layer - broadcasts them to the active watch session
//! - Watcher Layer (Tokio) - polls the status endpoint until an outcome

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use surebank_watch::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use surebank_watch::{
    callback_url, ChannelPlatform, DeepLink, HttpStatusSource, LifecycleEvent, LifecyclePlatform,
    LinkClassifier, NoopPlatform, Outcome, PaymentWatcher, Settings, WatchOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "surebank-watch", version, about = "Watch a SureBank payment until it resolves")]
struct Cli {
    /// Config file (defaults to ~/.surebank/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a payment reference; reads `resume` or deep links from stdin
    Watch {
        reference: String,
        #[arg(long)]
        max_attempts: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Behave like a web host: no lifecycle events
        #[arg(long)]
        no_lifecycle: bool,
    },
    /// Parse a deep link and print its resolved route
    Link { url: String },
    /// Print the redirect URL to hand to the payment gateway
    CallbackUrl { reference: String },
    /// Write a default config file
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&settings.log_dir, LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(
        app = APP_NAME,
        version = APP_VERSION,
        config = %config_path.display(),
        "Starting"
    );

    match cli.command {
        Command::Watch {
            reference,
            max_attempts,
            interval_ms,
            timeout_secs,
            no_lifecycle,
        } => {
            let overrides = WatchOverrides {
                max_attempts,
                poll_interval: interval_ms.map(Duration::from_millis),
                timeout: timeout_secs.map(Duration::from_secs),
            };
            run_watch(&settings, reference, overrides, no_lifecycle).await
        }
        Command::Link { url } => {
            let link = DeepLink::parse(&url, &settings.deep_link.scheme)?;
            let route = link.route();
            let output = serde_json::json!({ "link": link, "route": route });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::CallbackUrl { reference } => {
            println!("{}", callback_url(&settings.deep_link, &reference)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::InitConfig => {
            if config_path.exists() {
                anyhow::bail!("{} already exists", config_path.display());
            }
            Settings::default().save(&config_path)?;
            println!("Wrote {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run one watch session and map its outcome to an exit code
async fn run_watch(
    settings: &Settings,
    reference: String,
    overrides: WatchOverrides,
    no_lifecycle: bool,
) -> anyhow::Result<ExitCode> {
    let source = Arc::new(HttpStatusSource::new(settings));
    let classifier = LinkClassifier::new(&settings.deep_link)?;

    let platform: Arc<dyn LifecyclePlatform> = if no_lifecycle {
        Arc::new(NoopPlatform)
    } else {
        let platform = Arc::new(ChannelPlatform::new());
        spawn_host_thread(platform.clone());
        platform
    };

    let mut watcher =
        PaymentWatcher::new(source, platform, classifier).with_defaults(settings.watch_config());
    eprintln!("Watching {} (type `resume` or paste a deep link)", reference);

    let outcome = tokio::select! {
        outcome = watcher.watch(reference, Some(overrides)) => outcome,
        _ = tokio::signal::ctrl_c() => None,
    };
    watcher.stop();

    let Some(outcome) = outcome else {
        eprintln!("Stopped");
        return Ok(ExitCode::from(130));
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(match outcome {
        Outcome::Succeeded(_) => ExitCode::SUCCESS,
        Outcome::Failed(_) => ExitCode::from(1),
        Outcome::TimedOut(_) => ExitCode::from(2),
    })
}

/// Read host events on a detached OS thread. A blocking stdin read cannot be
/// cancelled, so it must stay off the runtime or shutdown waits for input.
fn spawn_host_thread(platform: Arc<ChannelPlatform>) {
    let spawned = std::thread::Builder::new()
        .name("host-events".into())
        .spawn(move || run_host_loop(std::io::stdin().lock(), &platform));
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Host event thread failed to start");
    }
}

/// Stand-in for the mobile runtime: each input line is a lifecycle event
fn run_host_loop(input: impl BufRead, platform: &ChannelPlatform) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if let Some(event) = LifecycleEvent::from_line(&line) {
                    let delivered = platform.emit(event);
                    tracing::debug!(delivered, "Host event forwarded");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reading host events failed");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_host_loop_forwards_each_line() {
        let platform = ChannelPlatform::new();
        let mut subscription = platform.subscribe().unwrap();

        let input = Cursor::new("resume\n\nsurebank://payment?reference=ref_1\n");
        run_host_loop(input, &platform);

        assert_eq!(subscription.recv().await, Some(LifecycleEvent::Resumed { url: None }));
        assert_eq!(
            subscription.recv().await,
            Some(LifecycleEvent::UrlOpened {
                url: "surebank://payment?reference=ref_1".into()
            })
        );
    }
}
