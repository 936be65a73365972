use crate::config::AppConfig;
use crate::errors::BookingError;
use crate::services::clock::Clock;
use crate::services::notifications::NotificationDispatch;
use crate::services::store::fallback::LocalFallbackStore;
use crate::services::store::BookingStore;

pub struct AppState {
    /// `None` when no database is configured.
    pub store: Option<Box<dyn BookingStore>>,
    pub fallback: LocalFallbackStore,
    pub config: AppConfig,
    pub notifier: Box<dyn NotificationDispatch>,
    pub clock: Box<dyn Clock>,
}

impl AppState {
    /// The authoritative store, for flows that cannot fall back.
    pub fn store(&self) -> Result<&dyn BookingStore, BookingError> {
        self.store.as_deref().ok_or(BookingError::StoreUnavailable)
    }
}
