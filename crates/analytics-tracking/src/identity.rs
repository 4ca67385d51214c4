//! Resolves a session contact to its durable xConnect record.
//!
//! The record is keyed by the tracker identifier: the configured source plus
//! the session contact id in dashless hex. Missing records are created as
//! anonymous contacts and submitted straight away. The created record is
//! returned as built locally, so it carries no facets.
//!
//! Store failures, including submit conflicts, are returned to the caller.

use std::sync::Arc;

use xconnect_client::{
    ContactExpandOptions, ContactIdentifier, IdentificationLevel, IdentifiedContactReference,
    RemoteContact, XConnectClient, XConnectError,
};

use crate::contact::{SessionContact, tracker_identifier};

#[derive(Clone)]
pub struct ContactResolver {
    client: Arc<dyn XConnectClient>,
    identifier_source: String,
}

impl ContactResolver {
    pub fn new(client: Arc<dyn XConnectClient>, identifier_source: impl Into<String>) -> Self {
        Self {
            client,
            identifier_source: identifier_source.into(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<dyn XConnectClient> {
        &self.client
    }

    #[must_use]
    pub fn identifier_source(&self) -> &str {
        &self.identifier_source
    }

    #[must_use]
    pub fn tracker_reference(&self, contact: &SessionContact) -> IdentifiedContactReference {
        contact.tracker_reference(&self.identifier_source)
    }

    /// Fetches the record for `contact`, creating it if absent. `facets`
    /// names the facets to load; `None` loads none.
    pub fn get_or_create(
        &self,
        contact: &SessionContact,
        facets: Option<&[&str]>,
    ) -> Result<RemoteContact, XConnectError> {
        let reference = self.tracker_reference(contact);
        let expand = ContactExpandOptions::from_optional(facets);

        if let Some(existing) = self.client.get(&reference, &expand)? {
            return Ok(existing);
        }

        let created = self.new_tracker_contact(contact);
        self.client.add_contact(&created)?;
        self.client.submit()?;
        log_created(&reference, &created);
        Ok(created)
    }

    /// Non-blocking form of [`ContactResolver::get_or_create`].
    pub async fn get_or_create_async(
        &self,
        contact: &SessionContact,
        facets: Option<&[&str]>,
    ) -> Result<RemoteContact, XConnectError> {
        let reference = self.tracker_reference(contact);
        let expand = ContactExpandOptions::from_optional(facets);

        if let Some(existing) = self.client.get_async(&reference, &expand).await? {
            return Ok(existing);
        }

        let created = self.new_tracker_contact(contact);
        self.client.add_contact(&created)?;
        self.client.submit_async().await?;
        log_created(&reference, &created);
        Ok(created)
    }

    fn new_tracker_contact(&self, contact: &SessionContact) -> RemoteContact {
        RemoteContact::new(ContactIdentifier::new(
            self.identifier_source.clone(),
            tracker_identifier(contact.contact_id),
            IdentificationLevel::Anonymous,
        ))
    }
}

fn log_created(reference: &IdentifiedContactReference, created: &RemoteContact) {
    tracing::info!(
        source = %reference.source,
        identifier = %reference.identifier,
        xconnect_contact_id = %created.id,
        "created xconnect contact for session contact"
    );
}
