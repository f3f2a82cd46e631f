use bay_street::universe::{DealStore, StoreError, StoredDeal};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local universe used when no `BAY_STORE_PATH` is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDealStore {
    deals: Arc<Mutex<Vec<StoredDeal>>>,
}

impl DealStore for InMemoryDealStore {
    fn append(&self, deals: &[StoredDeal]) -> Result<(), StoreError> {
        let mut guard = self
            .deals
            .lock()
            .map_err(|_| StoreError::Unavailable("deal store mutex poisoned".to_string()))?;
        guard.extend_from_slice(deals);
        Ok(())
    }

    fn load(&self) -> Result<Vec<StoredDeal>, StoreError> {
        let guard = self
            .deals
            .lock()
            .map_err(|_| StoreError::Unavailable("deal store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }
}
