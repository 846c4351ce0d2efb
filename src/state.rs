//! Shared application state for the embedding layer (REST server, binaries).
//!
//! Holds the loaded config and the open working store. The analytical core
//! never touches this — services receive `&CrmDb` and `&dyn
//! InvoicingProvider` directly, so each request runs over its own snapshot.

use std::sync::Mutex;

use crate::config::{load_config, Config};
use crate::db::CrmDb;
use crate::error::CrmError;
use crate::invoicing::InvoicingClient;
use crate::matching::MatchThresholds;

pub struct AppState {
    pub config: Mutex<Option<Config>>,
    pub db: Mutex<Option<CrmDb>>,
    pub thresholds: MatchThresholds,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}", e);
                None
            }
        };

        let db = match CrmDb::open() {
            Ok(db) => Some(db),
            Err(e) => {
                log::warn!("Failed to open working store: {}. DB features disabled.", e);
                None
            }
        };

        Self {
            config: Mutex::new(config),
            db: Mutex::new(db),
            thresholds: MatchThresholds::default(),
        }
    }

    /// Run a closure against the open store.
    pub fn with_db<F, T>(&self, f: F) -> Result<T, CrmError>
    where
        F: FnOnce(&CrmDb) -> Result<T, CrmError>,
    {
        let guard = self
            .db
            .lock()
            .map_err(|_| CrmError::Internal("DB lock poisoned".to_string()))?;
        let db = guard
            .as_ref()
            .ok_or_else(|| CrmError::Internal("Database not initialized".to_string()))?;
        f(db)
    }

    /// Build an invoicing client from the current config. Fails fast with
    /// the configuration error when the integration is absent.
    pub fn invoicing_client(&self) -> Result<InvoicingClient, CrmError> {
        let guard = self
            .config
            .lock()
            .map_err(|_| CrmError::Internal("Config lock poisoned".to_string()))?;
        let invoicing = guard.as_ref().and_then(|c| c.invoicing.as_ref());
        Ok(InvoicingClient::from_config(invoicing)?)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
