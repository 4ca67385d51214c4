use analytics_tracking::{
    EventOptions, GoalDefinition, MemoryContactManager, MemoryDefinitionManager,
    OutcomeDefinition, PageEventDefinition, SessionContact, TrackerService, TrackerSession,
    TrackingConfig, TrackingContext, create_or_update_default_facet,
};
use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use uuid::Uuid;
use xconnect_client::{Facet, MemoryXConnectClient, PersonalInformation, XConnectClient};

/// Runs one visit through the tracker against in-memory collaborators.
#[derive(Parser, Debug)]
struct Args {
    /// Session contact id. A random id is used when omitted.
    #[arg(long)]
    visitor_id: Option<Uuid>,
    /// Identification source, e.g. `email`.
    #[arg(long, default_value = "email")]
    source: String,
    /// Identifier value within the source.
    #[arg(long, default_value = "visitor@example.com")]
    identifier: String,
    /// Identify even when the contact is already known.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = TrackingConfig::from_env().context("load tracking config")?;

    let download = PageEventDefinition {
        id: Uuid::new_v4(),
        name: "Download".to_string(),
        engagement_value_points: 10,
    };
    let register = GoalDefinition {
        id: Uuid::new_v4(),
        name: "Register".to_string(),
        engagement_value_points: 50,
    };
    let purchase = OutcomeDefinition {
        id: Uuid::new_v4(),
        name: "Product Purchase".to_string(),
        is_monetary_value_applicable: true,
    };

    let client = MemoryXConnectClient::shared();
    let contact_manager = MemoryContactManager::shared();
    let service = TrackerService::new(
        config.clone(),
        MemoryDefinitionManager::invariant([download.clone()]).shared(),
        MemoryDefinitionManager::invariant([register.clone()]).shared(),
        MemoryDefinitionManager::invariant([purchase.clone()]).shared(),
        contact_manager.clone(),
    );

    let contact = match args.visitor_id {
        Some(id) => SessionContact::with_id(id),
        None => SessionContact::new_anonymous(),
    };
    let mut context = TrackingContext::open(
        &config,
        Some(TrackerSession::new(Some(contact.clone()), "/downloads")),
    );

    let page_event = service.track_page_event(
        &mut context,
        download.id,
        &EventOptions::new().data("whitepaper.pdf").data_key("pdf"),
    )?;
    tracing::info!(result = ?page_event, "page event tracked");

    let resolver = service.resolver(client.clone());
    let facets = [PersonalInformation::DEFAULT_FACET_KEY];
    let mut remote = resolver
        .get_or_create_async(&contact, Some(facets.as_slice()))
        .await
        .context("resolve xconnect contact")?;
    create_or_update_default_facet::<PersonalInformation, _>(
        &mut remote,
        client.as_ref(),
        |info| info.preferred_language = Some("en".to_string()),
    )?;
    client.submit_async().await.context("submit facets")?;
    tracing::info!(xconnect_contact_id = %remote.id, "xconnect contact ready");

    let identified = service.identify_contact(
        &mut context,
        client.as_ref(),
        &args.source,
        &args.identifier,
        args.force,
    )?;
    tracing::info!(outcome = ?identified, "identification finished");

    let goal = service.track_goal(&mut context, register.id, &EventOptions::new().value(75))?;
    tracing::info!(result = ?goal, "goal tracked");

    let outcome = service.track_outcome(&mut context, purchase.id, "USD", Decimal::new(4999, 2))?;
    tracing::info!(result = ?outcome, "outcome tracked");

    if let Some(session) = context.close() {
        let summary = serde_json::to_string_pretty(&session).context("encode session")?;
        tracing::info!(
            contacts = client.contact_count(),
            submits = client.submit_count(),
            collection_saves = contact_manager.save_count(),
            "visit complete\n{summary}"
        );
    }
    Ok(())
}
