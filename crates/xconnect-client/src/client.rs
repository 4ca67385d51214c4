use async_trait::async_trait;
use serde_json::Value;

use crate::error::XConnectError;
use crate::types::{ContactExpandOptions, IdentifiedContactReference, RemoteContact};

/// Connection to the experience-data store.
///
/// Reads go straight to the store. Writes are staged on the client and
/// applied in one batch by `submit`/`submit_async`; a failed submit
/// discards the batch.
#[async_trait]
pub trait XConnectClient: Send + Sync {
    fn get(
        &self,
        reference: &IdentifiedContactReference,
        expand: &ContactExpandOptions,
    ) -> Result<Option<RemoteContact>, XConnectError>;

    async fn get_async(
        &self,
        reference: &IdentifiedContactReference,
        expand: &ContactExpandOptions,
    ) -> Result<Option<RemoteContact>, XConnectError>;

    fn add_contact(&self, contact: &RemoteContact) -> Result<(), XConnectError>;

    /// Stages a whole-facet write for `contact`.
    fn set_facet(
        &self,
        contact: &RemoteContact,
        facet_key: &str,
        facet: Value,
    ) -> Result<(), XConnectError>;

    fn submit(&self) -> Result<(), XConnectError>;

    async fn submit_async(&self) -> Result<(), XConnectError>;
}
