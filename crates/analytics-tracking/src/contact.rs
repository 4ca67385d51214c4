use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xconnect_client::{ContactIdentifier, IdentificationLevel, IdentifiedContactReference};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSaveMode {
    /// Saved only when the tracker detects changes.
    #[default]
    Default,
    AlwaysSave,
    NeverSave,
}

/// The visitor as seen by the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContact {
    pub contact_id: Uuid,
    pub identification_level: IdentificationLevel,
    pub is_new: bool,
    pub save_mode: ContactSaveMode,
    pub identifiers: Vec<ContactIdentifier>,
}

impl SessionContact {
    #[must_use]
    pub fn new_anonymous() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    #[must_use]
    pub fn with_id(contact_id: Uuid) -> Self {
        Self {
            contact_id,
            identification_level: IdentificationLevel::Anonymous,
            is_new: true,
            save_mode: ContactSaveMode::Default,
            identifiers: Vec::new(),
        }
    }

    /// Fixed-width lowercase hex form of the contact id, no dashes.
    #[must_use]
    pub fn tracker_identifier(&self) -> String {
        tracker_identifier(self.contact_id)
    }

    #[must_use]
    pub fn tracker_reference(&self, source: &str) -> IdentifiedContactReference {
        IdentifiedContactReference::new(source, self.tracker_identifier())
    }

    /// Adds `identifier` unless an equal one is already attached. A known
    /// identifier promotes the contact to `Known`.
    pub fn attach_identifier(&mut self, identifier: ContactIdentifier) {
        if identifier.level == IdentificationLevel::Known {
            self.identification_level = IdentificationLevel::Known;
        }
        if !self.identifiers.contains(&identifier) {
            self.identifiers.push(identifier);
        }
    }

    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.identification_level == IdentificationLevel::Known
    }
}

#[must_use]
pub fn tracker_identifier(contact_id: Uuid) -> String {
    contact_id.simple().to_string()
}
