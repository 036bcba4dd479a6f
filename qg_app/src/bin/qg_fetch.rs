use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use qg_app::cli;
use qg_app::config_loader;
use qg_app::report;
use qg_app::shutdown_handler;
use qg_app::tracing_setup;
use qg_http::HttpClient;
use qg_http::HttpError;
use qg_http::PacedClient;
use qg_pacer::Pacer;
use qg_pacer::PacerConfig;
use qg_pacer::PacerError;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Exit code when the provider quota ran out in fail-fast mode
const EXIT_QUOTA_EXHAUSTED: u8 = 2;

enum Outcome {
    Completed,
    QuotaExhausted,
}

async fn run(args: cli::CliArgs) -> anyhow::Result<Outcome> {
    let config = config_loader::load_app_config_or_default(&args.config_path);

    let pacer_config = PacerConfig::try_from(config.pacer.clone()).context("invalid [pacer] settings")?;
    let pacer = Pacer::new(pacer_config)?;

    let credentials = config.api.credentials();
    if credentials.is_none() {
        warn!(env = %config.api.key_env, "No API key found, sending requests without credentials");
    }
    let http = HttpClient::with_config(config.http.client_config(), credentials.as_ref())?;
    let mut client = PacedClient::new(http, pacer).with_max_rejection_retries(config.http.max_rejection_retries);

    let running = Arc::new(AtomicBool::new(true));
    shutdown_handler::install(Arc::clone(&running))?;

    for url in &args.urls {
        if !shutdown_handler::is_running(&running) {
            info!("Stopping batch early");
            break;
        }

        let request = client.get(url);
        match client.execute(request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await;
                if let Err(err) = &body {
                    error!(url = %url, status, error = %err, "Failed to read response body");
                }
                println!("{}", report::response_line(url, status, body));
            }
            Err(HttpError::Pacer(PacerError::QuotaExhausted { reset_in, .. })) => {
                error!(url = %url, reset_in_secs = reset_in.as_secs(), "Quota exhausted, aborting batch");
                return Ok(Outcome::QuotaExhausted);
            }
            Err(err) => {
                error!(url = %url, error = %err, "Request failed");
                println!("{}", report::failure_line(url, &err));
            }
        }
    }

    Ok(Outcome::Completed)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let args = match cli::from_env() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{}", cli::USAGE);
            return ExitCode::FAILURE;
        }
    };
    if args.help || args.urls.is_empty() {
        eprintln!("{}", cli::USAGE);
        return if args.help { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }

    // Logging settings come from the same file, so peek at it before tracing is up
    let log_settings = config_loader::load_app_config(&args.config_path).map(|c| c.log).unwrap_or_default();
    let _guard = tracing_setup::init("qg_fetch", &log_settings);

    match run(args).await {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::QuotaExhausted) => ExitCode::from(EXIT_QUOTA_EXHAUSTED),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
