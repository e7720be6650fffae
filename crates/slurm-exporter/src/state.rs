use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::metrics::ExporterMetrics;
use crate::source::NodeSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn NodeSource>,
    pub metrics: Arc<ExporterMetrics>,
    /// Held for the duration of a collection cycle so concurrent scrapes
    /// never run `sinfo` in parallel.
    pub cycle: Arc<Mutex<()>>,
    pub exit_on_source_failure: bool,
    /// Set to the failure reason when the source fails and
    /// `exit_on_source_failure` is on.
    pub fatal: Arc<watch::Sender<Option<String>>>,
}

impl AppState {
    pub fn new(source: Arc<dyn NodeSource>, exit_on_source_failure: bool) -> Self {
        Self {
            source,
            metrics: Arc::new(ExporterMetrics::default()),
            cycle: Arc::new(Mutex::new(())),
            exit_on_source_failure,
            fatal: Arc::new(watch::Sender::new(None)),
        }
    }
}
