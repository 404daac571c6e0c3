//! Write path: provisioning the remote application and pushing documents.

mod batcher;
mod provisioner;

pub use batcher::{DocumentBatcher, ReindexSummary};
pub use provisioner::{AppProvisioner, ProvisionOutcome};
