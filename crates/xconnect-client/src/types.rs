use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::XConnectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationLevel {
    Anonymous,
    Known,
}

impl IdentificationLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Known => "known",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactIdentifier {
    pub source: String,
    pub identifier: String,
    pub level: IdentificationLevel,
}

impl ContactIdentifier {
    pub fn new(
        source: impl Into<String>,
        identifier: impl Into<String>,
        level: IdentificationLevel,
    ) -> Self {
        Self {
            source: source.into(),
            identifier: identifier.into(),
            level,
        }
    }

    #[must_use]
    pub fn reference(&self) -> IdentifiedContactReference {
        IdentifiedContactReference::new(self.source.clone(), self.identifier.clone())
    }
}

/// Lookup key for a contact: one (source, value) pair out of its identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifiedContactReference {
    pub source: String,
    pub identifier: String,
}

impl IdentifiedContactReference {
    pub fn new(source: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, identifier: &ContactIdentifier) -> bool {
        self.source == identifier.source && self.identifier == identifier.identifier
    }
}

/// Facets to load alongside a contact. `None` loads no facets at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactExpandOptions {
    facets: Option<Vec<String>>,
}

impl ContactExpandOptions {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_facets<I, S>(facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            facets: Some(facets.into_iter().map(Into::into).collect()),
        }
    }

    pub fn from_optional(facets: Option<&[&str]>) -> Self {
        match facets {
            Some(keys) => Self::with_facets(keys.iter().copied()),
            None => Self::none(),
        }
    }

    #[must_use]
    pub fn facets(&self) -> Option<&[String]> {
        self.facets.as_deref()
    }

    #[must_use]
    pub fn includes(&self, facet_key: &str) -> bool {
        self.facets
            .as_ref()
            .is_some_and(|keys| keys.iter().any(|key| key == facet_key))
    }
}

/// A contact record as held by the remote store, or as staged locally
/// before submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    pub id: Uuid,
    pub identifiers: Vec<ContactIdentifier>,
    #[serde(default)]
    pub facets: BTreeMap<String, Value>,
}

impl RemoteContact {
    #[must_use]
    pub fn new(identifier: ContactIdentifier) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifiers: vec![identifier],
            facets: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn identifier(&self, source: &str) -> Option<&ContactIdentifier> {
        self.identifiers
            .iter()
            .find(|identifier| identifier.source == source)
    }

    #[must_use]
    pub fn facet_value(&self, facet_key: &str) -> Option<&Value> {
        self.facets.get(facet_key)
    }

    /// Decodes a loaded facet. `Ok(None)` when the facet is absent or was
    /// not expanded on load.
    pub fn get_facet<T>(&self, facet_key: &str) -> Result<Option<T>, XConnectError>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.facets.get(facet_key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|error| XConnectError::Serialization(format!("{facet_key}: {error}")))
    }
}
