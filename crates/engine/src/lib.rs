pub mod aggregator;
pub mod config;
pub mod predictor;
pub mod projector;

pub use aggregator::{Ensemble, NoSignal};
pub use config::EnsembleConfig;
pub use predictor::{
    LinearPredictor, LocalModelSource, ModelCache, ModelSource, PredictorConfig, PredictorError,
    RemoteModelSource, TieBreakPredictor,
};
pub use projector::{ExpiryPolicy, Projection, Projector, ProjectorConfig};
