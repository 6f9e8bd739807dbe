use crate::error::ApiError;
use crate::metrics::RequestMetrics;
use inference::Classifier;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

type Loader = Arc<dyn Fn() -> anyhow::Result<Classifier> + Send + Sync>;

/// Process-wide classifier, initialized at most once.
///
/// Concurrent first requests wait on the same initialization; once it
/// succeeds every later access is a plain `Arc` clone. A failed load leaves
/// the cell empty and the next request tries again.
pub struct ClassifierCell {
    cell: OnceCell<Arc<Classifier>>,
    loader: Loader,
}

impl ClassifierCell {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<Classifier> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    /// A cell that is already initialized with `classifier`.
    pub fn ready(classifier: Classifier) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(classifier))),
            loader: Arc::new(|| -> anyhow::Result<Classifier> {
                anyhow::bail!("classifier is already initialized")
            }),
        }
    }

    pub async fn get_or_load(&self) -> Result<Arc<Classifier>, ApiError> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                let started = Instant::now();
                tracing::info!("Loading classifier");

                let classifier = tokio::task::spawn_blocking(move || loader())
                    .await?
                    .map_err(ApiError::Load)?;

                let info = classifier.info();
                tracing::info!(
                    model = %info.name,
                    backend = %info.backend,
                    labels = classifier.labels().len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Classifier ready"
                );

                Ok::<_, ApiError>(Arc::new(classifier))
            })
            .await?;

        Ok(Arc::clone(classifier))
    }

    /// The classifier if it has been initialized; never triggers a load.
    pub fn get(&self) -> Option<Arc<Classifier>> {
        self.cell.get().cloned()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<ClassifierCell>,
    pub metrics: Arc<RequestMetrics>,
}

impl AppState {
    pub fn new(classifier: ClassifierCell) -> Self {
        Self {
            classifier: Arc::new(classifier),
            metrics: Arc::new(RequestMetrics::default()),
        }
    }
}
