//! Client contract for the xConnect experience-data store.
//!
//! Contacts are addressed by an identifier source and value pair. Writes
//! (`add_contact`, `set_facet`) are staged on the client's local change-set
//! and only reach the store on `submit`/`submit_async`.

#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod error;
pub mod facets;
mod memory;
mod types;

pub use client::XConnectClient;
pub use error::XConnectError;
pub use facets::{EmailAddress, EmailAddressList, Facet, PersonalInformation};
pub use memory::MemoryXConnectClient;
pub use types::{
    ContactExpandOptions, ContactIdentifier, IdentificationLevel, IdentifiedContactReference,
    RemoteContact,
};

/// Identifier source the session tracker registers its contacts under.
pub const TRACKER_IDENTIFIER_SOURCE: &str = "xDB.Tracker";
