//! Per-request tracking state.
//!
//! A [`TrackingContext`] is opened by the host at request start, passed
//! explicitly to every tracking call, and closed at request end, handing
//! the session (with everything recorded on it) back to the host.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::contact::SessionContact;
use crate::definitions::{GoalDefinition, OutcomeDefinition, PageEventDefinition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEventData {
    pub page_event_definition_id: Uuid,
    pub name: String,
    pub text: String,
    pub data: Option<String>,
    pub data_key: Option<String>,
    pub value: i32,
    pub is_goal: bool,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeData {
    pub outcome_definition_id: Uuid,
    pub currency_code: String,
    pub monetary_value: Decimal,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPage {
    pub url: String,
    pub page_events: Vec<PageEventData>,
    pub outcomes: Vec<OutcomeData>,
}

impl CurrentPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Records the event with the definition's name and engagement value;
    /// callers overlay the remaining fields on the returned entry.
    pub fn register_page_event(&mut self, definition: &PageEventDefinition) -> &mut PageEventData {
        self.push_event(PageEventData {
            page_event_definition_id: definition.id,
            name: definition.name.clone(),
            text: definition.name.clone(),
            data: None,
            data_key: None,
            value: definition.engagement_value_points,
            is_goal: false,
            datetime: Utc::now(),
        })
    }

    pub fn register_goal(&mut self, definition: &GoalDefinition) -> &mut PageEventData {
        self.push_event(PageEventData {
            page_event_definition_id: definition.id,
            name: definition.name.clone(),
            text: definition.name.clone(),
            data: None,
            data_key: None,
            value: definition.engagement_value_points,
            is_goal: true,
            datetime: Utc::now(),
        })
    }

    pub fn register_outcome(
        &mut self,
        definition: &OutcomeDefinition,
        currency_code: impl Into<String>,
        monetary_value: Decimal,
    ) -> &mut OutcomeData {
        let index = self.outcomes.len();
        self.outcomes.push(OutcomeData {
            outcome_definition_id: definition.id,
            currency_code: currency_code.into(),
            monetary_value,
            datetime: Utc::now(),
        });
        &mut self.outcomes[index]
    }

    #[must_use]
    pub fn goals(&self) -> impl Iterator<Item = &PageEventData> {
        self.page_events.iter().filter(|event| event.is_goal)
    }

    fn push_event(&mut self, event: PageEventData) -> &mut PageEventData {
        let index = self.page_events.len();
        self.page_events.push(event);
        &mut self.page_events[index]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSession {
    pub session_id: Uuid,
    active: bool,
    contact: Option<SessionContact>,
    current_page: CurrentPage,
    previous_pages: Vec<CurrentPage>,
}

impl TrackerSession {
    pub fn new(contact: Option<SessionContact>, url: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            active: false,
            contact,
            current_page: CurrentPage::new(url),
            previous_pages: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    #[must_use]
    pub fn contact(&self) -> Option<&SessionContact> {
        self.contact.as_ref()
    }

    pub fn contact_mut(&mut self) -> Option<&mut SessionContact> {
        self.contact.as_mut()
    }

    /// Installs `contact` as the session contact in one step and returns
    /// the one it replaced.
    pub fn replace_contact(&mut self, contact: SessionContact) -> Option<SessionContact> {
        self.contact.replace(contact)
    }

    #[must_use]
    pub fn current_page(&self) -> &CurrentPage {
        &self.current_page
    }

    pub fn current_page_mut(&mut self) -> &mut CurrentPage {
        &mut self.current_page
    }

    #[must_use]
    pub fn previous_pages(&self) -> &[CurrentPage] {
        &self.previous_pages
    }

    /// Moves on to a new page; the finished page is kept in the history.
    pub fn begin_page(&mut self, url: impl Into<String>) {
        let finished = std::mem::replace(&mut self.current_page, CurrentPage::new(url));
        self.previous_pages.push(finished);
    }
}

#[derive(Debug)]
pub struct TrackingContext {
    enabled: bool,
    session: Option<TrackerSession>,
}

impl TrackingContext {
    pub fn open(config: &TrackingConfig, session: Option<TrackerSession>) -> Self {
        tracing::debug!(
            enabled = config.enabled,
            has_session = session.is_some(),
            "tracking context opened"
        );
        Self {
            enabled: config.enabled,
            session,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn current(&self) -> Option<&TrackerSession> {
        self.session.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut TrackerSession> {
        self.session.as_mut()
    }

    /// Starts collection on the current session. Returns `false` when there
    /// is no session to start.
    pub fn start_tracking(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                if !session.is_active() {
                    tracing::debug!(session_id = %session.session_id, "tracking started");
                }
                session.start();
                true
            }
            None => false,
        }
    }

    pub fn close(self) -> Option<TrackerSession> {
        if let Some(session) = self.session.as_ref() {
            tracing::debug!(
                session_id = %session.session_id,
                page_events = session.current_page().page_events.len(),
                outcomes = session.current_page().outcomes.len(),
                "tracking context closed"
            );
        }
        self.session
    }
}
