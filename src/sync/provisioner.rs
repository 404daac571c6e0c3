//! App Provisioner
//!
//! Makes sure the remote application exists before anything is pushed.
//!
//! ```text
//! get_app(app)
//!     │
//!     ├─→ errors[0].code == 2001 → derive AppSchema → create_app → Created
//!     │                                                   └─→ FAIL → Config error
//!     ├─→ status == FAIL (any other code) → Config error
//!     │
//!     └─→ otherwise → AlreadyExists (the existing schema is never compared)
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::metrics;
use crate::remote::SearchService;
use crate::schema::{AppSchema, TableMetadata};

/// What `ensure_app` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

pub struct AppProvisioner<S: ?Sized> {
    service: Arc<S>,
}

impl<S: SearchService + ?Sized> AppProvisioner<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Create `app_name` from the table's columns unless it already exists.
    ///
    /// Any failure other than "app not found" is terminal and surfaces as
    /// `SyncError::Config`; transport errors propagate unchanged.
    pub async fn ensure_app(
        &self,
        app_name: &str,
        meta: &TableMetadata,
    ) -> Result<ProvisionOutcome, SyncError> {
        let lookup = self.service.get_app(app_name).await?.envelope();

        if lookup.is_not_found() {
            let schema = AppSchema::from_table(app_name, meta)?;
            info!(
                app = %app_name,
                table = %meta.table_name,
                search_fields = ?schema.search_fields,
                filter_fields = schema.filter_fields.len(),
                "Creating search application"
            );

            let created = self.service.create_app(&schema).await?.envelope();
            if created.is_failure() {
                metrics::record_provision("error");
                warn!(app = %app_name, error = %created.error_message(), "Application creation rejected");
                return Err(SyncError::Config(created.error_message()));
            }

            metrics::record_provision("created");
            return Ok(ProvisionOutcome::Created);
        }

        if lookup.is_failure() {
            metrics::record_provision("error");
            warn!(app = %app_name, error = %lookup.error_message(), "Application lookup failed");
            return Err(SyncError::Config(lookup.error_message()));
        }

        debug!(app = %app_name, "Search application already exists");
        metrics::record_provision("exists");
        Ok(ProvisionOutcome::AlreadyExists)
    }
}
