//! Switchboard entry-point: loads settings, wires the dispatcher and serves
//! the HTTP API.

use color_eyre::eyre::WrapErr;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use switchboard::config::AppSettings;
use switchboard::logging::Logger;
use switchboard::server::{Adapters, ServerConfig, build_dispatcher, create_server};

fn init_tracing(json: bool) {
    let builder = fmt().with_env_filter(EnvFilter::from_default_env());
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    init_tracing(settings.log_json());

    let config = ServerConfig::from_settings(&settings).wrap_err("invalid settings")?;
    let logger = Logger::tracing(config.redaction().clone());
    let adapters = Adapters::in_memory();
    let dispatcher =
        build_dispatcher(&logger, &adapters).wrap_err("failed to register message handlers")?;

    create_server(&config, &logger, dispatcher, adapters.authenticator)
        .wrap_err("failed to start HTTP server")?
        .await
        .wrap_err("HTTP server terminated")
}
