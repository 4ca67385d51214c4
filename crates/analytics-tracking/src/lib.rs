//! Session tracker integration with the xConnect experience-data store.
//!
//! - [`ContactResolver`] maps a session contact onto its durable xConnect
//!   record, creating an anonymous record when none exists.
//! - [`facet`] holds the read-modify-write helpers for contact facets.
//! - [`TrackerService`] records page events, goals and outcomes on the
//!   current page and identifies contacts, reconciling the session with
//!   the store.
//!
//! Tracking state is never global: the host opens a [`TrackingContext`]
//! per request and passes it to every call.

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod contact;
pub mod contact_manager;
pub mod definitions;
pub mod error;
pub mod facet;
pub mod identity;
pub mod service;
pub mod session;

pub use config::{ConfigError, TrackingConfig};
pub use contact::{ContactSaveMode, SessionContact};
pub use contact_manager::{ContactManager, ContactManagerError, MemoryContactManager};
pub use definitions::{
    Culture, Definition, DefinitionManager, GoalDefinition, MemoryDefinitionManager,
    OutcomeDefinition, PageEventDefinition,
};
pub use error::TrackingError;
pub use facet::{
    create_or_update_default_facet, create_or_update_facet, get_or_create_facet,
    merge_facet_value,
};
pub use identity::ContactResolver;
pub use service::{EventOptions, IdentifyOutcome, TrackResult, TrackerService};
pub use session::{CurrentPage, OutcomeData, PageEventData, TrackerSession, TrackingContext};
