use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, FileMarketData};
use engine::{
    Ensemble, EnsembleConfig, LinearPredictor, LocalModelSource, ModelSource, NoSignal,
    RemoteModelSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    let ensemble_cfg = match &cfg.signal_config_path {
        Some(path) => EnsembleConfig::load(path)
            .with_context(|| format!("loading ensemble config {}", path.display()))?,
        None => EnsembleConfig::default(),
    };
    info!(symbol = %cfg.symbol, timeframe = %cfg.timeframe, "SignalBot starting");

    // ── Tie-break predictor ───────────────────────────────────────────────────
    let source: Arc<dyn ModelSource> = match &cfg.model_base_url {
        Some(url) => Arc::new(RemoteModelSource::new(url, &cfg.model_dir)?),
        None => Arc::new(LocalModelSource::new(&cfg.model_dir)),
    };
    let predictor = LinearPredictor::new(source, cfg.model_load_timeout, ensemble_cfg.predictor);

    // ── Ensemble ──────────────────────────────────────────────────────────────
    let ensemble = Ensemble::from_config(&ensemble_cfg)?.with_predictor(Arc::new(predictor));
    let supplier = FileMarketData::new(&cfg.candles_path);

    match ensemble
        .evaluate_symbol(&supplier, &cfg.symbol, &cfg.timeframe, cfg.candle_limit)
        .await
    {
        Ok(signal) => {
            println!("{}", serde_json::to_string_pretty(&signal)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(NoSignal::DataUnavailable(reason)) => {
            warn!(reason = %reason, "Market data unavailable");
            Ok(ExitCode::from(2))
        }
        Err(reason) => {
            info!(reason = %reason, "No signal");
            Ok(ExitCode::from(1))
        }
    }
}
