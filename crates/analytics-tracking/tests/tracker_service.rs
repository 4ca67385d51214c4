use std::sync::Arc;

use analytics_tracking::{
    ContactManager, ContactResolver, EventOptions, GoalDefinition, IdentifyOutcome,
    MemoryContactManager, MemoryDefinitionManager, OutcomeDefinition, PageEventDefinition,
    SessionContact, TrackResult, TrackerService, TrackerSession, TrackingConfig, TrackingContext,
    TrackingError,
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use uuid::Uuid;
use xconnect_client::{ContactIdentifier, IdentificationLevel, MemoryXConnectClient, XConnectError};

struct Harness {
    service: TrackerService,
    client: Arc<MemoryXConnectClient>,
    contact_manager: Arc<MemoryContactManager>,
    page_event: PageEventDefinition,
    goal: GoalDefinition,
    outcome: OutcomeDefinition,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(TrackingConfig::default())
    }

    fn with_config(config: TrackingConfig) -> Self {
        let page_event = PageEventDefinition {
            id: Uuid::new_v4(),
            name: "Download".to_string(),
            engagement_value_points: 10,
        };
        let goal = GoalDefinition {
            id: Uuid::new_v4(),
            name: "Register".to_string(),
            engagement_value_points: 50,
        };
        let outcome = OutcomeDefinition {
            id: Uuid::new_v4(),
            name: "Purchase".to_string(),
            is_monetary_value_applicable: true,
        };
        let client = MemoryXConnectClient::shared();
        let contact_manager = MemoryContactManager::shared();
        let service = TrackerService::new(
            config,
            MemoryDefinitionManager::invariant([page_event.clone()]).shared(),
            MemoryDefinitionManager::invariant([goal.clone()]).shared(),
            MemoryDefinitionManager::invariant([outcome.clone()]).shared(),
            contact_manager.clone(),
        );
        Self {
            service,
            client,
            contact_manager,
            page_event,
            goal,
            outcome,
        }
    }

    fn context(&self, contact: Option<SessionContact>) -> TrackingContext {
        TrackingContext::open(
            self.service.config(),
            Some(TrackerSession::new(contact, "/home")),
        )
    }

    fn resolver(&self) -> ContactResolver {
        self.service.resolver(self.client.clone())
    }
}

fn session_contact(context: &TrackingContext) -> Result<&SessionContact> {
    context
        .current()
        .and_then(TrackerSession::contact)
        .context("session contact")
}

#[test]
fn liveness_check_starts_inactive_session() {
    let harness = Harness::new();
    let mut context = harness.context(None);
    assert!(!context.current().is_some_and(TrackerSession::is_active));

    assert!(harness.service.is_active(&mut context));
    assert!(context.current().is_some_and(TrackerSession::is_active));
}

#[test]
fn liveness_is_false_without_session_or_when_disabled() {
    let harness = Harness::new();
    let mut no_session = TrackingContext::open(harness.service.config(), None);
    assert!(!harness.service.is_active(&mut no_session));

    let disabled = Harness::with_config(TrackingConfig {
        enabled: false,
        ..TrackingConfig::default()
    });
    let mut context = disabled.context(Some(SessionContact::new_anonymous()));
    assert!(!disabled.service.is_active(&mut context));
    assert!(!context.current().is_some_and(TrackerSession::is_active));
}

#[test]
fn auto_start_off_reports_inactive_sessions() {
    let harness = Harness::with_config(TrackingConfig {
        auto_start: false,
        ..TrackingConfig::default()
    });
    let mut context = harness.context(None);
    assert!(!harness.service.is_active(&mut context));

    context.start_tracking();
    assert!(harness.service.is_active(&mut context));
}

#[test]
fn page_event_registers_with_overlays() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(None);

    let result = harness.service.track_page_event(
        &mut context,
        harness.page_event.id,
        &EventOptions::new()
            .text("Whitepaper")
            .data("whitepaper.pdf")
            .data_key("pdf")
            .value(5),
    )?;
    assert_eq!(result, TrackResult::Registered);

    let page = context.current().context("session")?.current_page();
    let event = page.page_events.first().context("event")?;
    assert_eq!(event.page_event_definition_id, harness.page_event.id);
    assert_eq!(event.text, "Whitepaper");
    assert_eq!(event.data.as_deref(), Some("whitepaper.pdf"));
    assert_eq!(event.data_key.as_deref(), Some("pdf"));
    assert_eq!(event.value, 5);
    assert!(!event.is_goal);
    Ok(())
}

#[test]
fn page_event_without_value_keeps_definition_value() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(None);

    harness
        .service
        .track_page_event(&mut context, harness.page_event.id, &EventOptions::new())?;

    let page = context.current().context("session")?.current_page();
    let event = page.page_events.first().context("event")?;
    assert_eq!(event.value, 10);
    assert_eq!(event.text, "Download");
    assert_eq!(event.data, None);
    Ok(())
}

#[test]
fn unknown_definitions_are_skipped_without_error() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(Some(SessionContact::new_anonymous()));

    let page_event = harness
        .service
        .track_page_event(&mut context, Uuid::new_v4(), &EventOptions::new())?;
    let goal = harness
        .service
        .track_goal(&mut context, Uuid::new_v4(), &EventOptions::new())?;
    let outcome = harness
        .service
        .track_outcome(&mut context, Uuid::new_v4(), "USD", Decimal::new(100, 0))?;

    assert_eq!(page_event, TrackResult::DefinitionNotFound);
    assert_eq!(goal, TrackResult::DefinitionNotFound);
    assert_eq!(outcome, TrackResult::DefinitionNotFound);

    let page = context.current().context("session")?.current_page();
    assert!(page.page_events.is_empty());
    assert!(page.outcomes.is_empty());
    Ok(())
}

#[test]
fn nil_ids_are_rejected() {
    let harness = Harness::new();
    let mut context = harness.context(None);

    let result = harness
        .service
        .track_page_event(&mut context, Uuid::nil(), &EventOptions::new());
    assert!(matches!(result, Err(TrackingError::InvalidArgument(_))));

    let result = harness
        .service
        .track_goal(&mut context, Uuid::nil(), &EventOptions::new());
    assert!(matches!(result, Err(TrackingError::InvalidArgument(_))));

    let result = harness
        .service
        .track_outcome(&mut context, Uuid::nil(), "USD", Decimal::new(1, 0));
    assert!(matches!(result, Err(TrackingError::InvalidArgument(_))));
}

#[test]
fn disabled_tracking_records_nothing() -> Result<()> {
    let harness = Harness::with_config(TrackingConfig {
        enabled: false,
        ..TrackingConfig::default()
    });
    let mut context = harness.context(Some(SessionContact::new_anonymous()));

    let result = harness
        .service
        .track_goal(&mut context, harness.goal.id, &EventOptions::new())?;
    assert_eq!(result, TrackResult::Inactive);
    assert!(
        context
            .current()
            .context("session")?
            .current_page()
            .page_events
            .is_empty()
    );
    Ok(())
}

#[test]
fn goal_registers_as_goal_event() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(None);

    let result = harness.service.track_goal(
        &mut context,
        harness.goal.id,
        &EventOptions::new().data("newsletter"),
    )?;
    assert_eq!(result, TrackResult::Registered);

    let page = context.current().context("session")?.current_page();
    let goals = page.goals().collect::<Vec<_>>();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].value, 50);
    assert_eq!(goals[0].data.as_deref(), Some("newsletter"));
    Ok(())
}

#[test]
fn outcome_requires_a_contact() -> Result<()> {
    let harness = Harness::new();

    let mut anonymous_session = harness.context(None);
    let result = harness.service.track_outcome(
        &mut anonymous_session,
        harness.outcome.id,
        "USD",
        Decimal::new(4999, 2),
    )?;
    assert_eq!(result, TrackResult::NoContact);

    let mut context = harness.context(Some(SessionContact::new_anonymous()));
    let result = harness.service.track_outcome(
        &mut context,
        harness.outcome.id,
        "EUR",
        Decimal::new(4999, 2),
    )?;
    assert_eq!(result, TrackResult::Registered);

    let session = context.close().context("session")?;
    let outcome = session
        .current_page()
        .outcomes
        .first()
        .context("outcome")?;
    assert_eq!(outcome.outcome_definition_id, harness.outcome.id);
    assert_eq!(outcome.currency_code, "EUR");
    assert_eq!(outcome.monetary_value, Decimal::new(4999, 2));
    Ok(())
}

#[test]
fn identify_new_contact_without_remote_record_keeps_session_contact() -> Result<()> {
    let harness = Harness::new();
    let contact = SessionContact::new_anonymous();
    let mut context = harness.context(Some(contact.clone()));

    let outcome = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(outcome, IdentifyOutcome::RemoteContactMissing);

    let identified = session_contact(&context)?;
    assert_eq!(identified.contact_id, contact.contact_id);
    assert!(identified.is_new);
    assert_eq!(identified.identification_level, IdentificationLevel::Known);
    assert_eq!(
        identified.save_mode,
        analytics_tracking::ContactSaveMode::AlwaysSave
    );
    assert_eq!(harness.contact_manager.save_count(), 1);
    Ok(())
}

#[test]
fn identify_reconciles_with_store_when_remote_record_exists() -> Result<()> {
    let harness = Harness::new();
    let contact = SessionContact::new_anonymous();
    let remote = harness.resolver().get_or_create(&contact, None)?;
    let mut context = harness.context(Some(contact.clone()));

    let outcome = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(
        outcome,
        IdentifyOutcome::Reconciled {
            contact_id: contact.contact_id,
            xconnect_contact_id: remote.id,
        }
    );

    let reloaded = session_contact(&context)?;
    assert!(!reloaded.is_new);
    assert!(reloaded.is_identified());
    assert_eq!(
        reloaded.identifiers,
        vec![ContactIdentifier::new(
            "email",
            "ada@example.com",
            IdentificationLevel::Known
        )]
    );
    assert!(harness.contact_manager.is_cached(contact.contact_id));
    Ok(())
}

#[test]
fn identify_skips_known_contact_unless_forced() -> Result<()> {
    let harness = Harness::new();
    let mut contact = SessionContact::new_anonymous();
    contact.is_new = false;
    contact.attach_identifier(ContactIdentifier::new(
        "email",
        "ada@example.com",
        IdentificationLevel::Known,
    ));
    let mut context = harness.context(Some(contact.clone()));

    let outcome = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "crm",
        "C-1001",
        false,
    )?;
    assert_eq!(outcome, IdentifyOutcome::Skipped);
    assert_eq!(session_contact(&context)?.identifiers, contact.identifiers);
    assert_eq!(harness.contact_manager.save_count(), 0);
    assert_eq!(harness.client.get_count(), 0);

    let outcome = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "crm",
        "C-1001",
        true,
    )?;
    assert_eq!(outcome, IdentifyOutcome::RemoteContactMissing);
    assert_eq!(session_contact(&context)?.identifiers.len(), 2);
    Ok(())
}

#[test]
fn identify_ignores_store_conflicts() -> Result<()> {
    let harness = Harness::new();
    let contact = SessionContact::new_anonymous();
    harness.resolver().get_or_create(&contact, None)?;
    let mut context = harness.context(Some(contact.clone()));
    harness
        .client
        .fail_next_get(XConnectError::Conflict("contacts merged concurrently".to_string()));

    let outcome = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(
        outcome,
        IdentifyOutcome::ConflictIgnored {
            code: "xdb_conflict",
            message: "contacts merged concurrently".to_string(),
        }
    );

    let kept = session_contact(&context)?;
    assert!(kept.is_new);
    assert!(kept.is_identified());
    assert_eq!(kept.identifiers.len(), 1);
    assert_eq!(
        harness
            .contact_manager
            .stored(contact.contact_id)
            .map(|stored| stored.identifiers.len()),
        Some(1)
    );
    Ok(())
}

#[test]
fn identify_surfaces_non_execution_failures() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(Some(SessionContact::new_anonymous()));
    harness
        .client
        .fail_next_get(XConnectError::Transport("connection refused".to_string()));

    let result = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    );
    let error = match result {
        Err(TrackingError::Remote(error)) => error,
        other => anyhow::bail!("expected transport failure to propagate, got {other:?}"),
    };
    assert_eq!(error.code(), "transport");
    assert!(session_contact(&context)?.is_identified());
    Ok(())
}

#[test]
fn identify_validates_arguments_and_activity() -> Result<()> {
    let harness = Harness::new();
    let mut context = harness.context(Some(SessionContact::new_anonymous()));

    let result = harness.service.identify_contact(
        &mut context,
        harness.client.as_ref(),
        " ",
        "ada@example.com",
        false,
    );
    assert!(matches!(result, Err(TrackingError::InvalidArgument(_))));

    let mut no_contact = harness.context(None);
    let outcome = harness.service.identify_contact(
        &mut no_contact,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(outcome, IdentifyOutcome::NoContact);

    let mut no_session = TrackingContext::open(harness.service.config(), None);
    let outcome = harness.service.identify_contact(
        &mut no_session,
        harness.client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(outcome, IdentifyOutcome::Inactive);
    Ok(())
}

/// Collection store that forgets contacts on reload.
struct ForgetfulContactManager {
    inner: MemoryContactManager,
}

impl ContactManager for ForgetfulContactManager {
    fn save_contact_to_collection_db(
        &self,
        contact: &SessionContact,
    ) -> Result<(), analytics_tracking::ContactManagerError> {
        self.inner.save_contact_to_collection_db(contact)
    }

    fn add_identifier(
        &self,
        contact: &mut SessionContact,
        identifier: ContactIdentifier,
    ) -> Result<(), analytics_tracking::ContactManagerError> {
        self.inner.add_identifier(contact, identifier)
    }

    fn remove_from_session(
        &self,
        contact_id: Uuid,
    ) -> Result<(), analytics_tracking::ContactManagerError> {
        self.inner.remove_from_session(contact_id)
    }

    fn load_contact(
        &self,
        _contact_id: Uuid,
    ) -> Result<Option<SessionContact>, analytics_tracking::ContactManagerError> {
        Ok(None)
    }
}

#[test]
fn identify_keeps_session_contact_when_reload_finds_nothing() -> Result<()> {
    let client = MemoryXConnectClient::shared();
    let contact_manager = Arc::new(ForgetfulContactManager {
        inner: MemoryContactManager::new(),
    });
    let service = TrackerService::new(
        TrackingConfig::default(),
        MemoryDefinitionManager::<PageEventDefinition>::new().shared(),
        MemoryDefinitionManager::<GoalDefinition>::new().shared(),
        MemoryDefinitionManager::<OutcomeDefinition>::new().shared(),
        contact_manager.clone(),
    );
    let contact = SessionContact::new_anonymous();
    service.resolver(client.clone()).get_or_create(&contact, None)?;
    let mut context = TrackingContext::open(
        service.config(),
        Some(TrackerSession::new(Some(contact.clone()), "/")),
    );

    let outcome = service.identify_contact(
        &mut context,
        client.as_ref(),
        "email",
        "ada@example.com",
        false,
    )?;
    assert_eq!(
        outcome,
        IdentifyOutcome::ReloadMissing {
            contact_id: contact.contact_id
        }
    );
    let kept = session_contact(&context)?;
    assert_eq!(kept.contact_id, contact.contact_id);
    assert!(kept.is_identified());
    assert!(contact_manager.inner.is_cached(contact.contact_id));
    assert_eq!(contact_manager.inner.save_count(), 2);
    assert_eq!(
        contact_manager.inner.stored(contact.contact_id).as_ref(),
        Some(kept)
    );
    Ok(())
}
