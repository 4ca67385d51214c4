use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;
use xconnect_client::{
    ContactExpandOptions, ContactIdentifier, IdentificationLevel, XConnectClient,
};

use crate::config::TrackingConfig;
use crate::contact::ContactSaveMode;
use crate::contact_manager::ContactManager;
use crate::definitions::{
    Culture, DefinitionManager, GoalDefinition, OutcomeDefinition, PageEventDefinition,
};
use crate::error::{TrackingError, require_id, require_non_empty};
use crate::identity::ContactResolver;
use crate::session::{PageEventData, TrackingContext};

/// Optional fields laid over a freshly registered page event or goal.
/// Absent fields leave the registered defaults alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOptions {
    pub text: Option<String>,
    pub data: Option<String>,
    pub data_key: Option<String>,
    pub value: Option<i32>,
}

impl EventOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn data_key(mut self, data_key: impl Into<String>) -> Self {
        self.data_key = Some(data_key.into());
        self
    }

    pub fn value(mut self, value: i32) -> Self {
        self.value = Some(value);
        self
    }

    pub fn apply_to(&self, event: &mut PageEventData) {
        if let Some(data) = &self.data {
            event.data = Some(data.clone());
        }
        if let Some(data_key) = &self.data_key {
            event.data_key = Some(data_key.clone());
        }
        if let Some(text) = &self.text {
            event.text.clone_from(text);
        }
        if let Some(value) = self.value {
            event.value = value;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackResult {
    Registered,
    /// Tracking is disabled or there is no session.
    Inactive,
    DefinitionNotFound,
    NoContact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyOutcome {
    Inactive,
    NoContact,
    /// Contact already known and the call was not forced.
    Skipped,
    /// The session contact was reloaded from the collection store.
    Reconciled {
        contact_id: Uuid,
        xconnect_contact_id: Uuid,
    },
    /// xConnect has no record under the tracker identifier yet.
    RemoteContactMissing,
    /// The record exists but the collection store returned nothing to
    /// reload; the session keeps its identified contact, saved back to the
    /// collection store.
    ReloadMissing { contact_id: Uuid },
    /// xConnect rejected the lookup with an execution failure. The
    /// identifier stays attached; reconciliation did not happen.
    ConflictIgnored { code: &'static str, message: String },
}

impl IdentifyOutcome {
    /// Whether this call attached the identifier to the session contact.
    #[must_use]
    pub fn identified(&self) -> bool {
        !matches!(self, Self::Inactive | Self::NoContact | Self::Skipped)
    }
}

/// Entry point for page event, goal and outcome tracking and for contact
/// identification. Every call takes the request's [`TrackingContext`].
#[derive(Clone)]
pub struct TrackerService {
    config: TrackingConfig,
    page_events: Arc<dyn DefinitionManager<PageEventDefinition>>,
    goals: Arc<dyn DefinitionManager<GoalDefinition>>,
    outcomes: Arc<dyn DefinitionManager<OutcomeDefinition>>,
    contact_manager: Arc<dyn ContactManager>,
}

impl TrackerService {
    pub fn new(
        config: TrackingConfig,
        page_events: Arc<dyn DefinitionManager<PageEventDefinition>>,
        goals: Arc<dyn DefinitionManager<GoalDefinition>>,
        outcomes: Arc<dyn DefinitionManager<OutcomeDefinition>>,
        contact_manager: Arc<dyn ContactManager>,
    ) -> Self {
        Self {
            config,
            page_events,
            goals,
            outcomes,
            contact_manager,
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Resolver keyed by the configured tracker identifier source.
    #[must_use]
    pub fn resolver(&self, client: Arc<dyn XConnectClient>) -> ContactResolver {
        ContactResolver::new(client, self.config.identifier_source.clone())
    }

    /// Liveness check. An existing but inactive session is started as part
    /// of the check.
    pub fn is_active(&self, context: &mut TrackingContext) -> bool {
        if !self.config.enabled || !context.is_enabled() {
            return false;
        }
        let Some(session) = context.current() else {
            return false;
        };
        if !session.is_active() {
            if !self.config.auto_start {
                return false;
            }
            context.start_tracking();
        }
        true
    }

    pub fn track_page_event(
        &self,
        context: &mut TrackingContext,
        page_event_id: Uuid,
        options: &EventOptions,
    ) -> Result<TrackResult, TrackingError> {
        require_id("page_event_id", page_event_id)?;

        if !self.is_active(context) {
            return Ok(TrackResult::Inactive);
        }

        let Some(definition) = self.page_events.get(page_event_id, &Culture::invariant()) else {
            tracing::warn!(page_event_id = %page_event_id, "cannot find page event");
            return Ok(TrackResult::DefinitionNotFound);
        };

        let Some(session) = context.current_mut() else {
            return Ok(TrackResult::Inactive);
        };
        let event = session.current_page_mut().register_page_event(&definition);
        options.apply_to(event);
        Ok(TrackResult::Registered)
    }

    pub fn track_goal(
        &self,
        context: &mut TrackingContext,
        goal_id: Uuid,
        options: &EventOptions,
    ) -> Result<TrackResult, TrackingError> {
        require_id("goal_id", goal_id)?;

        if !self.is_active(context) {
            return Ok(TrackResult::Inactive);
        }

        let Some(definition) = self.goals.get(goal_id, &Culture::invariant()) else {
            tracing::warn!(goal_id = %goal_id, "cannot find goal");
            return Ok(TrackResult::DefinitionNotFound);
        };

        let Some(session) = context.current_mut() else {
            return Ok(TrackResult::Inactive);
        };
        let event = session.current_page_mut().register_goal(&definition);
        options.apply_to(event);
        Ok(TrackResult::Registered)
    }

    pub fn track_outcome(
        &self,
        context: &mut TrackingContext,
        outcome_definition_id: Uuid,
        currency_code: &str,
        monetary_value: Decimal,
    ) -> Result<TrackResult, TrackingError> {
        require_id("outcome_definition_id", outcome_definition_id)?;

        if !self.is_active(context) {
            return Ok(TrackResult::Inactive);
        }
        let Some(session) = context.current_mut() else {
            return Ok(TrackResult::Inactive);
        };
        if session.contact().is_none() {
            return Ok(TrackResult::NoContact);
        }

        let Some(definition) = self
            .outcomes
            .get(outcome_definition_id, &Culture::invariant())
        else {
            tracing::warn!(outcome_definition_id = %outcome_definition_id, "cannot find outcome");
            return Ok(TrackResult::DefinitionNotFound);
        };

        session
            .current_page_mut()
            .register_outcome(&definition, currency_code, monetary_value);
        Ok(TrackResult::Registered)
    }

    /// Identifies the session contact by `source`/`identifier` and, when
    /// xConnect already holds its record, reloads the contact from the
    /// collection store so the session matches the merged record.
    ///
    /// Contacts that are already known are left alone unless `force` is
    /// set. Execution failures from the xConnect lookup are not returned:
    /// the identifier is attached either way and the outcome says the
    /// reload was skipped.
    pub fn identify_contact(
        &self,
        context: &mut TrackingContext,
        client: &dyn XConnectClient,
        source: &str,
        identifier: &str,
        force: bool,
    ) -> Result<IdentifyOutcome, TrackingError> {
        require_non_empty("source", source)?;
        require_non_empty("identifier", identifier)?;

        if !self.is_active(context) {
            return Ok(IdentifyOutcome::Inactive);
        }
        let Some(session) = context.current_mut() else {
            return Ok(IdentifyOutcome::Inactive);
        };
        let Some(contact) = session.contact_mut() else {
            return Ok(IdentifyOutcome::NoContact);
        };

        let eligible = force
            || contact.is_new
            || contact.identification_level == IdentificationLevel::Anonymous;
        if !eligible {
            tracing::debug!(
                contact_id = %contact.contact_id,
                "contact already identified, skipping"
            );
            return Ok(IdentifyOutcome::Skipped);
        }

        contact.save_mode = ContactSaveMode::AlwaysSave;
        self.contact_manager.save_contact_to_collection_db(contact)?;
        self.contact_manager.add_identifier(
            contact,
            ContactIdentifier::new(source, identifier, IdentificationLevel::Known),
        )?;

        let contact_id = contact.contact_id;
        let reference = contact.tracker_reference(&self.config.identifier_source);
        tracing::info!(
            contact_id = %contact_id,
            source = %source,
            "session contact identified"
        );

        match client.get(&reference, &ContactExpandOptions::none()) {
            Ok(Some(remote)) => {
                self.contact_manager.remove_from_session(contact_id)?;
                let Some(reloaded) = self.contact_manager.load_contact(contact_id)? else {
                    tracing::warn!(
                        contact_id = %contact_id,
                        "identified contact missing from collection store on reload"
                    );
                    if let Some(kept) = session.contact() {
                        self.contact_manager.save_contact_to_collection_db(kept)?;
                    }
                    return Ok(IdentifyOutcome::ReloadMissing { contact_id });
                };
                session.replace_contact(reloaded);
                Ok(IdentifyOutcome::Reconciled {
                    contact_id,
                    xconnect_contact_id: remote.id,
                })
            }
            Ok(None) => {
                tracing::debug!(
                    contact_id = %contact_id,
                    "no xconnect contact under tracker identifier yet"
                );
                Ok(IdentifyOutcome::RemoteContactMissing)
            }
            Err(error) if error.is_execution_failure() => {
                tracing::warn!(
                    contact_id = %contact_id,
                    reason_code = error.code(),
                    reason = %error,
                    "xconnect lookup failed during identification, keeping session contact"
                );
                Ok(IdentifyOutcome::ConflictIgnored {
                    code: error.code(),
                    message: error.message(),
                })
            }
            Err(error) => Err(error.into()),
        }
    }
}
