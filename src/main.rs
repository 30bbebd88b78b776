//! VoiceMap CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voicemap::cli::{
    config_cmd::handle_config_command, load_merged_config, resolve_endpoint, run_devices,
    run_record, run_upload, Cli, Commands, Presenter, RecordOptions, UploadOptions, EXIT_ERROR,
    EXIT_USAGE_ERROR,
};
use voicemap::domain::config::AppConfig;
use voicemap::domain::transcription::Endpoint;
use voicemap::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voicemap=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut cli = Cli::parse();
    let presenter = Presenter::new();

    let upload_file = match cli.command.take() {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices) => return run_devices(),
        Some(Commands::Upload { file }) => Some(file),
        None => None,
    };

    // Build CLI config from args
    let cli_config = AppConfig {
        server_url: cli.server.clone(),
        mode: None,
        filename: cli.filename.clone(),
        max_duration: cli.max_duration.clone(),
        device: cli.device.clone(),
        sign_map: cli.sign_map.clone(),
    };

    let config = load_merged_config(cli_config).await;
    if let Some(ref mode) = config.mode {
        if let Err(e) = mode.parse::<Endpoint>() {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }
    let endpoint = resolve_endpoint(cli.sign, &config);
    let server_url = config.server_url_or_default().to_string();

    if let Some(file) = upload_file {
        return run_upload(UploadOptions {
            file,
            endpoint,
            server_url,
            sign_map: config.sign_map_path(),
        })
        .await;
    }

    let max_duration = match config.max_duration_or_default() {
        Ok(cap) => cap,
        Err(e) => {
            presenter.error(&format!("Invalid max-duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    run_record(RecordOptions {
        endpoint,
        server_url,
        filename: config.filename.clone(),
        max_duration,
        device: config.device.clone(),
        output: cli.output,
        upload: !cli.no_upload,
        sign_map: config.sign_map_path(),
    })
    .await
}
