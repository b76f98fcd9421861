use std::sync::Arc;

use crate::assist::AssistClient;
use crate::infrastructure::geocode::Geocoder;
use crate::infrastructure::object_store::ObjectStore;

/// Shared application state, constructed once in `main` and injected into
/// handlers. External-service clients live here rather than behind lazy
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub geocoder: Arc<Geocoder>,
    pub assist: Arc<AssistClient>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        geocoder: Arc<Geocoder>,
        assist: Arc<AssistClient>,
    ) -> Self {
        Self {
            store,
            geocoder,
            assist,
        }
    }
}
