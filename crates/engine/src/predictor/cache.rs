use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use url::Url;

use super::model::LinearModel;
use super::PredictorError;

/// Where model artifacts come from.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn load(&self, file_name: &str) -> Result<LinearModel, PredictorError>;
}

// ─── Local directory ─────────────────────────────────────────────────────────

/// Reads model files from a local directory.
#[derive(Debug, Clone)]
pub struct LocalModelSource {
    dir: PathBuf,
}

impl LocalModelSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

#[async_trait]
impl ModelSource for LocalModelSource {
    async fn load(&self, file_name: &str) -> Result<LinearModel, PredictorError> {
        let path = self.path(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                debug!(path = %path.display(), "Loaded model from disk");
                LinearModel::from_json(&raw)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PredictorError::ModelUnavailable(file_name.to_string()))
            }
            Err(e) => Err(PredictorError::Fetch(format!("{}: {e}", path.display()))),
        }
    }
}

// ─── Remote blob store ───────────────────────────────────────────────────────

/// Downloads missing models from a remote store and keeps a copy in the
/// local directory for later runs.
pub struct RemoteModelSource {
    base: Url,
    local: LocalModelSource,
    http: Client,
}

impl RemoteModelSource {
    pub fn new(base_url: &str, dir: impl Into<PathBuf>) -> Result<Self, PredictorError> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized)
            .map_err(|e| PredictorError::Fetch(format!("invalid model base url '{base_url}': {e}")))?;
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| PredictorError::Fetch(e.to_string()))?;
        Ok(Self {
            base,
            local: LocalModelSource::new(dir),
            http,
        })
    }

    pub fn url(&self, file_name: &str) -> Result<Url, PredictorError> {
        self.base
            .join(file_name)
            .map_err(|e| PredictorError::Fetch(e.to_string()))
    }

    async fn download(&self, file_name: &str) -> Result<LinearModel, PredictorError> {
        let url = self.url(file_name)?;
        info!(url = %url, "Downloading model");

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PredictorError::Fetch(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PredictorError::ModelUnavailable(file_name.to_string()));
        }
        let body = resp.text().await.map_err(|e| PredictorError::Fetch(e.to_string()))?;
        if !status.is_success() {
            return Err(PredictorError::Fetch(format!("HTTP {status}: {body}")));
        }

        let model = LinearModel::from_json(&body)?;
        let path = self.local.path(file_name);
        if let Some(dir) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                warn!(dir = %dir.display(), error = %e, "Cannot create model directory");
            }
        }
        match tokio::fs::write(&path, &body).await {
            Ok(()) => info!(path = %path.display(), "Model cached locally"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to cache model locally"),
        }
        Ok(model)
    }
}

#[async_trait]
impl ModelSource for RemoteModelSource {
    async fn load(&self, file_name: &str) -> Result<LinearModel, PredictorError> {
        match self.local.load(file_name).await {
            Err(PredictorError::ModelUnavailable(_)) => self.download(file_name).await,
            other => other,
        }
    }
}

// ─── Memoized cache ──────────────────────────────────────────────────────────

/// Loads each model at most once and shares it read-only afterwards.
///
/// Concurrent requests for the same uncached model wait on a single load
/// instead of starting their own. A failed load leaves the slot empty so a
/// later request can try again.
pub struct ModelCache {
    source: Arc<dyn ModelSource>,
    load_timeout: Duration,
    slots: Mutex<HashMap<String, Arc<OnceCell<Arc<LinearModel>>>>>,
}

impl ModelCache {
    pub fn new(source: Arc<dyn ModelSource>, load_timeout: Duration) -> Self {
        Self {
            source,
            load_timeout,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, file_name: &str) -> Result<Arc<LinearModel>, PredictorError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(file_name.to_string()).or_default().clone()
        };
        let model = slot
            .get_or_try_init(|| async {
                let loaded = tokio::time::timeout(self.load_timeout, self.source.load(file_name))
                    .await
                    .map_err(|_| PredictorError::Timeout(self.load_timeout))??;
                info!(model = %file_name, features = loaded.features.len(), "Model loaded");
                Ok::<_, PredictorError>(Arc::new(loaded))
            })
            .await?;
        Ok(model.clone())
    }

    /// Whether `file_name` is already loaded.
    pub async fn is_loaded(&self, file_name: &str) -> bool {
        self.slots
            .lock()
            .await
            .get(file_name)
            .is_some_and(|slot| slot.initialized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl ModelSource for CountingSource {
        async fn load(&self, file_name: &str) -> Result<LinearModel, PredictorError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if file_name.contains("missing") {
                return Err(PredictorError::ModelUnavailable(file_name.to_string()));
            }
            Ok(LinearModel {
                features: vec!["close".into()],
                weights: vec![1.0],
                bias: 0.0,
            })
        }
    }

    fn counting(delay_ms: u64) -> Arc<CountingSource> {
        Arc::new(CountingSource {
            loads: AtomicUsize::new(0),
            delay: Duration::from_millis(delay_ms),
        })
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_load() {
        let source = counting(50);
        let cache = Arc::new(ModelCache::new(source.clone(), Duration::from_secs(5)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get("model_eurusd_m1.json").await }));
        }
        for h in handles {
            assert!(h.await.unwrap().is_ok());
        }
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded("model_eurusd_m1.json").await);

        cache.get("model_gbpusd_m1.json").await.unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_load_is_retried_later() {
        let source = counting(0);
        let cache = ModelCache::new(source.clone(), Duration::from_secs(5));
        assert!(matches!(
            cache.get("model_missing_m1.json").await,
            Err(PredictorError::ModelUnavailable(_))
        ));
        assert!(!cache.is_loaded("model_missing_m1.json").await);
        assert!(cache.get("model_missing_m1.json").await.is_err());
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_load_times_out() {
        let cache = ModelCache::new(counting(500), Duration::from_millis(20));
        let err = cache.get("model_eurusd_m1.json").await.unwrap_err();
        assert!(matches!(err, PredictorError::Timeout(_)));
    }

    #[tokio::test]
    async fn local_source_reads_and_reports_missing_files() {
        let dir = std::env::temp_dir().join(format!("models-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("model_eurusd_m1.json"),
            r#"{"features":["close"],"weights":[0.5],"bias":0.1}"#,
        )
        .unwrap();

        let source = LocalModelSource::new(&dir);
        let model = source.load("model_eurusd_m1.json").await.unwrap();
        assert_eq!(model.weights, vec![0.5]);
        assert!(matches!(
            source.load("model_usdjpy_m1.json").await,
            Err(PredictorError::ModelUnavailable(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remote_urls_keep_the_base_path() {
        let remote = RemoteModelSource::new("https://models.example.com/forex", "models").unwrap();
        assert_eq!(
            remote.url("model_eurusd_m1.json").unwrap().as_str(),
            "https://models.example.com/forex/model_eurusd_m1.json"
        );
        assert!(RemoteModelSource::new("not a url", "models").is_err());
    }
}
