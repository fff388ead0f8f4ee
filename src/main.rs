use anyhow::{Context, Result};
use tracing::info;

use mocap_bench::alignment::align_take;
use mocap_bench::localization::correlate_take;
use mocap_bench::BenchConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => BenchConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => {
            info!("No config given, using defaults");
            BenchConfig::default()
        }
    };
    let layout = config.layout();
    info!("Evaluating take {}", layout.take_dir().display());

    let correlation = correlate_take(&config)
        .with_context(|| format!("Failed to correlate take {}", layout.take_dir().display()))?;
    if !correlation.failed.is_empty() {
        info!("Frames not localized: {:?}", correlation.failed);
    }

    let alignment = align_take(&config).context("Failed to align trajectories")?;
    info!(
        "Wrote {} ({} poses, rmse {:.4} m)",
        layout.aligned_estimate().display(),
        alignment.aligned.len(),
        alignment.rmse
    );
    info!("Transform:\n{}", alignment.transform.to_matrix());

    Ok(())
}
