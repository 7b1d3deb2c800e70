//! `restaurant` entry point.

use app::{AppError, Config};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let report = app::run(&config).await.inspect_err(|e| {
        tracing::error!(error = %e, "restaurant run failed");
    })?;
    println!("{report}");

    if config.print_metrics {
        println!("{}", metrics_handle.render());
    }
    Ok(())
}
