use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use xconnect_client::{Facet, RemoteContact, XConnectClient};

use crate::error::TrackingError;

/// The facet stored under `facet_key`, or a default instance when the
/// contact has none loaded.
pub fn get_or_create_facet<T>(contact: &RemoteContact, facet_key: &str) -> Result<T, TrackingError>
where
    T: Default + DeserializeOwned,
{
    Ok(contact.get_facet::<T>(facet_key)?.unwrap_or_default())
}

/// Applies `update` to the existing or default facet and stages the whole
/// facet on `client`. Nothing is submitted; batch several updates and
/// submit once.
pub fn create_or_update_facet<'a, T, F>(
    contact: &'a mut RemoteContact,
    client: &dyn XConnectClient,
    facet_key: &str,
    update: F,
) -> Result<&'a mut RemoteContact, TrackingError>
where
    T: Default + Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
{
    let mut facet = get_or_create_facet::<T>(contact, facet_key)?;
    let loaded = encode_facet(facet_key, &facet)?;
    update(&mut facet);
    let updated = encode_facet(facet_key, &facet)?;

    let merged = merge_facet_value(contact.facet_value(facet_key), &loaded, updated);

    client.set_facet(contact, facet_key, merged.clone())?;
    contact.facets.insert(facet_key.to_string(), merged);
    Ok(contact)
}

/// [`create_or_update_facet`] under the facet's default key.
pub fn create_or_update_default_facet<'a, T, F>(
    contact: &'a mut RemoteContact,
    client: &dyn XConnectClient,
    update: F,
) -> Result<&'a mut RemoteContact, TrackingError>
where
    T: Facet,
    F: FnOnce(&mut T),
{
    create_or_update_facet::<T, F>(contact, client, T::DEFAULT_FACET_KEY, update)
}

fn encode_facet<T: Serialize>(facet_key: &str, facet: &T) -> Result<Value, TrackingError> {
    serde_json::to_value(facet)
        .map_err(|error| TrackingError::FacetEncoding(format!("{facet_key}: {error}")))
}

/// Builds the payload written back for a facet.
///
/// `loaded` is the typed facet as decoded from `existing`, re-encoded before
/// the update ran. Stored fields that survive that round trip belong to the
/// typed facet, so `updated` decides them, including removals. Stored fields
/// the typed facet dropped are ones it does not model and are carried over.
/// Non-object payloads are replaced outright.
#[must_use]
pub fn merge_facet_value(existing: Option<&Value>, loaded: &Value, updated: Value) -> Value {
    match (existing, updated) {
        (Some(Value::Object(stored)), Value::Object(fields)) => {
            let modeled = loaded.as_object();
            let mut merged: Map<String, Value> = stored
                .iter()
                .filter(|(key, _)| !modeled.is_some_and(|modeled| modeled.contains_key(*key)))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            merged.extend(fields);
            Value::Object(merged)
        }
        (_, updated) => updated,
    }
}
