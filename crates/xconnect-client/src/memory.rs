use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::client::XConnectClient;
use crate::error::XConnectError;
use crate::types::{ContactExpandOptions, IdentifiedContactReference, RemoteContact};

/// In-process store plus change-set. Identifier uniqueness is enforced at
/// submit time, the way the real store reports duplicate identifiers.
#[derive(Default)]
pub struct MemoryXConnectClient {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    store: StoreState,
    pending: Vec<PendingOperation>,
    next_get_failure: Option<XConnectError>,
    get_count: u64,
    submit_count: u64,
}

#[derive(Default, Clone)]
struct StoreState {
    contacts: HashMap<Uuid, RemoteContact>,
    index: HashMap<IdentifiedContactReference, Uuid>,
}

#[derive(Debug, Clone)]
enum PendingOperation {
    AddContact(RemoteContact),
    SetFacet {
        contact_id: Uuid,
        facet_key: String,
        facet: Value,
    },
}

impl MemoryXConnectClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes a contact straight into the store, bypassing the change-set.
    pub fn seed_contact(&self, contact: RemoteContact) -> Result<(), XConnectError> {
        let mut inner = self.lock();
        inner.store.insert(contact)
    }

    /// The next `get`/`get_async` fails with `error` instead of reading.
    pub fn fail_next_get(&self, error: XConnectError) {
        self.lock().next_get_failure = Some(error);
    }

    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.lock().store.contacts.len()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    #[must_use]
    pub fn get_count(&self) -> u64 {
        self.lock().get_count
    }

    #[must_use]
    pub fn submit_count(&self) -> u64 {
        self.lock().submit_count
    }

    /// Committed copy of a contact with every facet loaded.
    #[must_use]
    pub fn stored_contact(&self, contact_id: Uuid) -> Option<RemoteContact> {
        self.lock().store.contacts.get(&contact_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(
        &self,
        reference: &IdentifiedContactReference,
        expand: &ContactExpandOptions,
    ) -> Result<Option<RemoteContact>, XConnectError> {
        let mut inner = self.lock();
        inner.get_count += 1;
        if let Some(error) = inner.next_get_failure.take() {
            return Err(error);
        }

        let Some(contact_id) = inner.store.index.get(reference) else {
            return Ok(None);
        };
        let Some(contact) = inner.store.contacts.get(contact_id) else {
            return Err(XConnectError::Execution(format!(
                "identifier index points at missing contact {contact_id}"
            )));
        };

        let mut loaded = contact.clone();
        loaded.facets.retain(|facet_key, _| expand.includes(facet_key));
        Ok(Some(loaded))
    }

    fn commit(&self) -> Result<(), XConnectError> {
        let mut inner = self.lock();
        inner.submit_count += 1;
        let pending = std::mem::take(&mut inner.pending);
        if pending.is_empty() {
            return Ok(());
        }

        let operation_count = pending.len();
        let mut next = inner.store.clone();
        for operation in pending {
            next.apply(operation)?;
        }
        inner.store = next;

        tracing::debug!(
            operations = operation_count,
            contacts = inner.store.contacts.len(),
            "xconnect batch submitted"
        );
        Ok(())
    }
}

impl StoreState {
    fn insert(&mut self, contact: RemoteContact) -> Result<(), XConnectError> {
        if self.contacts.contains_key(&contact.id) {
            return Err(XConnectError::Conflict(format!(
                "contact {} already exists",
                contact.id
            )));
        }
        for identifier in &contact.identifiers {
            let reference = identifier.reference();
            if let Some(owner) = self.index.get(&reference) {
                return Err(XConnectError::Conflict(format!(
                    "identifier {}:{} already belongs to contact {owner}",
                    reference.source, reference.identifier
                )));
            }
        }

        for identifier in &contact.identifiers {
            self.index.insert(identifier.reference(), contact.id);
        }
        self.contacts.insert(contact.id, contact);
        Ok(())
    }

    fn apply(&mut self, operation: PendingOperation) -> Result<(), XConnectError> {
        match operation {
            PendingOperation::AddContact(contact) => self.insert(contact),
            PendingOperation::SetFacet {
                contact_id,
                facet_key,
                facet,
            } => {
                let Some(contact) = self.contacts.get_mut(&contact_id) else {
                    return Err(XConnectError::InvalidOperation(format!(
                        "facet {facet_key} targets unknown contact {contact_id}"
                    )));
                };
                contact.facets.insert(facet_key, facet);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl XConnectClient for MemoryXConnectClient {
    fn get(
        &self,
        reference: &IdentifiedContactReference,
        expand: &ContactExpandOptions,
    ) -> Result<Option<RemoteContact>, XConnectError> {
        self.read(reference, expand)
    }

    async fn get_async(
        &self,
        reference: &IdentifiedContactReference,
        expand: &ContactExpandOptions,
    ) -> Result<Option<RemoteContact>, XConnectError> {
        self.read(reference, expand)
    }

    fn add_contact(&self, contact: &RemoteContact) -> Result<(), XConnectError> {
        if contact.identifiers.is_empty() {
            return Err(XConnectError::InvalidOperation(
                "contact must carry at least one identifier".to_string(),
            ));
        }
        self.lock()
            .pending
            .push(PendingOperation::AddContact(contact.clone()));
        Ok(())
    }

    fn set_facet(
        &self,
        contact: &RemoteContact,
        facet_key: &str,
        facet: Value,
    ) -> Result<(), XConnectError> {
        let facet_key = facet_key.trim();
        if facet_key.is_empty() {
            return Err(XConnectError::InvalidOperation(
                "facet key must not be empty".to_string(),
            ));
        }

        let mut inner = self.lock();
        let known = inner.store.contacts.contains_key(&contact.id)
            || inner.pending.iter().any(|operation| {
                matches!(operation, PendingOperation::AddContact(staged) if staged.id == contact.id)
            });
        if !known {
            return Err(XConnectError::InvalidOperation(format!(
                "contact {} is not tracked by this client",
                contact.id
            )));
        }

        inner.pending.push(PendingOperation::SetFacet {
            contact_id: contact.id,
            facet_key: facet_key.to_string(),
            facet,
        });
        Ok(())
    }

    fn submit(&self) -> Result<(), XConnectError> {
        self.commit()
    }

    async fn submit_async(&self) -> Result<(), XConnectError> {
        self.commit()
    }
}
