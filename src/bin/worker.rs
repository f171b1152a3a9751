use anyhow::Result;
use article_worker::{
    cli::Cli,
    config::RuntimeConfig,
    resolver::{BrowserEngine, WebDriverEngine},
    translate::GoogleTranslator,
    worker::{OutputConfig, ResultEnvelope, Worker, WorkerError, elapsed_ms, write_envelope},
};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let started = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output = OutputConfig {
        ascii_only: cli.ascii_output,
    };

    let (envelope, code) = match run(&cli).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = match e.downcast_ref::<WorkerError>() {
                Some(worker_error) => worker_error.envelope_message(),
                None => e.to_string(),
            };
            let code = e
                .downcast_ref::<WorkerError>()
                .map(WorkerError::exit_code)
                .unwrap_or(1);
            if cli.debug {
                tracing::error!(error = ?e, "worker setup failed");
            }
            (ResultEnvelope::failure(message, elapsed_ms(started)), code)
        }
    };

    write_envelope(&mut std::io::stdout().lock(), &envelope, output);
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<(ResultEnvelope, i32)> {
    let request = cli.request().map_err(WorkerError::from)?;

    // CLI flags override the environment
    let mut config = RuntimeConfig::from_env().map_err(WorkerError::from)?;
    if let Some(url) = &cli.webdriver_url {
        config = config.with_webdriver_url(url.clone());
    }
    if cli.detect_lang {
        config = config.with_detect_language(true);
    }

    let browser = config.webdriver_url().map(|endpoint| {
        let engine = WebDriverEngine::new(endpoint).with_command_timeout(config.nav_timeout());
        Arc::new(engine) as Arc<dyn BrowserEngine>
    });

    let mut worker = Worker::new(&config, browser)?;
    if request.target_lang().is_some() {
        match GoogleTranslator::new(config.translate_endpoint(), request.timeout()) {
            Ok(translator) => worker = worker.with_translator(Arc::new(translator)),
            Err(e) => warn!(error = %e, "translator unavailable, output stays untranslated"),
        }
    }

    Ok(worker.run(&request).await)
}

/// Diagnostics go to stderr; stdout carries only the JSON record.
fn init_tracing(debug: bool) {
    let default_directive = if debug { "article_worker=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
