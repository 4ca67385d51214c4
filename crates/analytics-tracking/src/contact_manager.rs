use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;
use xconnect_client::ContactIdentifier;

use crate::contact::SessionContact;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactManagerError {
    #[error("contact not found: {0}")]
    NotFound(Uuid),
    #[error("collection store failed: {0}")]
    Storage(String),
}

impl ContactManagerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "contact_not_found",
            Self::Storage(_) => "collection_store",
        }
    }
}

/// Collection-store side of the session tracker: persists session contacts
/// and maintains the shared session cache.
pub trait ContactManager: Send + Sync {
    fn save_contact_to_collection_db(
        &self,
        contact: &SessionContact,
    ) -> Result<(), ContactManagerError>;

    /// Attaches `identifier` to the session's copy of the contact and
    /// records it in the collection store.
    fn add_identifier(
        &self,
        contact: &mut SessionContact,
        identifier: ContactIdentifier,
    ) -> Result<(), ContactManagerError>;

    fn remove_from_session(&self, contact_id: Uuid) -> Result<(), ContactManagerError>;

    fn load_contact(&self, contact_id: Uuid) -> Result<Option<SessionContact>, ContactManagerError>;
}

#[derive(Default)]
pub struct MemoryContactManager {
    inner: Mutex<MemoryContactManagerInner>,
}

#[derive(Default)]
struct MemoryContactManagerInner {
    collection: HashMap<Uuid, SessionContact>,
    session_cache: HashSet<Uuid>,
    saves: u64,
}

impl MemoryContactManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn stored(&self, contact_id: Uuid) -> Option<SessionContact> {
        self.lock().collection.get(&contact_id).cloned()
    }

    #[must_use]
    pub fn is_cached(&self, contact_id: Uuid) -> bool {
        self.lock().session_cache.contains(&contact_id)
    }

    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, MemoryContactManagerInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContactManager for MemoryContactManager {
    fn save_contact_to_collection_db(
        &self,
        contact: &SessionContact,
    ) -> Result<(), ContactManagerError> {
        let mut inner = self.lock();
        inner.saves += 1;
        inner.collection.insert(contact.contact_id, contact.clone());
        inner.session_cache.insert(contact.contact_id);
        Ok(())
    }

    fn add_identifier(
        &self,
        contact: &mut SessionContact,
        identifier: ContactIdentifier,
    ) -> Result<(), ContactManagerError> {
        let mut inner = self.lock();
        let Some(stored) = inner.collection.get_mut(&contact.contact_id) else {
            return Err(ContactManagerError::NotFound(contact.contact_id));
        };
        stored.attach_identifier(identifier.clone());
        contact.attach_identifier(identifier);
        Ok(())
    }

    fn remove_from_session(&self, contact_id: Uuid) -> Result<(), ContactManagerError> {
        self.lock().session_cache.remove(&contact_id);
        Ok(())
    }

    fn load_contact(&self, contact_id: Uuid) -> Result<Option<SessionContact>, ContactManagerError> {
        let mut inner = self.lock();
        let Some(stored) = inner.collection.get(&contact_id) else {
            return Ok(None);
        };
        let mut loaded = stored.clone();
        loaded.is_new = false;
        inner.session_cache.insert(contact_id);
        Ok(Some(loaded))
    }
}
