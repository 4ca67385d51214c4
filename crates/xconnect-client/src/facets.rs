//! Typed facets from the collection model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named payload attached to a contact. Facets are always written whole,
/// so they must be default-constructible for the get-or-create path.
pub trait Facet: Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    const DEFAULT_FACET_KEY: &'static str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

impl Facet for PersonalInformation {
    const DEFAULT_FACET_KEY: &'static str = "Personal";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddress {
    pub smtp_address: String,
    #[serde(default)]
    pub validated: bool,
}

impl EmailAddress {
    pub fn new(smtp_address: impl Into<String>, validated: bool) -> Self {
        Self {
            smtp_address: smtp_address.into(),
            validated,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddressList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_key: Option<String>,
    #[serde(default)]
    pub others: std::collections::BTreeMap<String, EmailAddress>,
}

impl EmailAddressList {
    #[must_use]
    pub fn preferred(&self) -> Option<&EmailAddress> {
        self.preferred_key
            .as_deref()
            .and_then(|key| self.others.get(key))
    }

    /// Adds or replaces the address under `key` and marks it preferred.
    pub fn set_preferred(&mut self, key: impl Into<String>, address: EmailAddress) {
        let key = key.into();
        self.others.insert(key.clone(), address);
        self.preferred_key = Some(key);
    }
}

impl Facet for EmailAddressList {
    const DEFAULT_FACET_KEY: &'static str = "Emails";
}
