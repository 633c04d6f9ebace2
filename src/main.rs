//! CEP → weather services.
//!
//! ```text
//!   client ──POST /cep──▶ front ──POST /weather──▶ back ──▶ ViaCEP
//!                           │   (retry, backoff)     │  ──▶ WeatherAPI
//!                           └────── spans ───────────┴──▶ Zipkin
//! ```
//!
//! One binary, one service per process: `cep-weather front` or
//! `cep-weather back`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use cep_weather::config::{
    read_config, BackConfig, FrontConfig, ObservabilityConfig, TelemetryConfig, TemperatureProviderConfig,
    Validate, ValidationError,
};
use cep_weather::http::HttpServer;
use cep_weather::lifecycle::{wait_for_signal, Shutdown};
use cep_weather::observability::{init_logging, metrics, Tracer};

#[derive(Parser)]
#[command(name = "cep-weather")]
#[command(about = "CEP to weather pipeline services", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when absent.
    #[arg(short, long, global = true, env = "CEP_WEATHER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long, global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the CEP intake service (POST /cep)
    Front {
        /// Override the back service base URL.
        #[arg(long, env = "WEATHER_SERVICE_URL")]
        weather_service_url: Option<String>,
    },
    /// Run the weather service (POST /weather)
    Back {
        /// WeatherAPI key; overrides the configured one.
        #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Front { weather_service_url } => {
            let mut config: FrontConfig = read_config(cli.config.as_deref())?;
            if let Some(bind) = cli.bind {
                config.listener.bind_address = bind;
            }
            if let Some(url) = weather_service_url {
                config.upstream.weather_service_url = url;
            }
            check(&config)?;
            init(&config.observability);

            let tracer = tracer(config.service_name(), &config.telemetry)?;
            let server = HttpServer::front(&config, tracer.clone())?;
            serve(server, &config.listener.bind_address, tracer).await
        }
        Commands::Back { api_key } => {
            let mut config: BackConfig = read_config(cli.config.as_deref())?;
            if let Some(bind) = cli.bind {
                config.listener.bind_address = bind;
            }
            if let (Some(key), TemperatureProviderConfig::WeatherApi { api_key, .. }) =
                (api_key, &mut config.resolvers.temperature)
            {
                *api_key = key;
            }
            check(&config)?;
            init(&config.observability);

            let tracer = tracer(config.service_name(), &config.telemetry)?;
            let server = HttpServer::back(&config, tracer.clone())?;
            serve(server, &config.listener.bind_address, tracer).await
        }
    }
}

fn check(config: &impl Validate) -> anyhow::Result<()> {
    config.validate().map_err(|errors| {
        let joined = errors.iter().map(ValidationError::to_string).collect::<Vec<_>>().join(", ");
        anyhow::anyhow!("invalid configuration: {joined}")
    })
}

fn init(config: &ObservabilityConfig) {
    init_logging(config);
    tracing::info!("cep-weather v{} starting", env!("CARGO_PKG_VERSION"));

    if config.metrics_enabled {
        match config.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

fn tracer(service_name: &str, telemetry: &TelemetryConfig) -> anyhow::Result<Tracer> {
    if !telemetry.enabled {
        tracing::info!("Span export disabled");
        return Ok(Tracer::disabled(service_name));
    }
    Tracer::zipkin(service_name, telemetry).context("starting span exporter")
}

async fn serve(server: HttpServer, bind_address: &str, tracer: Tracer) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));
    server.run(listener, shutdown.subscribe()).await?;

    tracer.shutdown(Duration::from_secs(5)).await;
    tracing::info!("Shutdown complete");
    Ok(())
}
