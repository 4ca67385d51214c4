//! Marketing definition catalogs: page events, goals and outcomes.
//!
//! Definitions are read-only here. The host owns the catalogs and hands
//! the tracker a lookup per kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Culture a definition is resolved in. The empty name is the invariant
/// culture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Culture(String);

impl Culture {
    #[must_use]
    pub fn invariant() -> Self {
        Self(String::new())
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_invariant(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invariant() {
            f.write_str("invariant")
        } else {
            f.write_str(&self.0)
        }
    }
}

pub trait Definition: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEventDefinition {
    pub id: Uuid,
    pub name: String,
    pub engagement_value_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: Uuid,
    pub name: String,
    pub engagement_value_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDefinition {
    pub id: Uuid,
    pub name: String,
    pub is_monetary_value_applicable: bool,
}

macro_rules! impl_definition {
    ($($ty:ty),+) => {
        $(impl Definition for $ty {
            fn id(&self) -> Uuid {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        })+
    };
}

impl_definition!(PageEventDefinition, GoalDefinition, OutcomeDefinition);

pub trait DefinitionManager<D: Definition>: Send + Sync {
    fn get(&self, id: Uuid, culture: &Culture) -> Option<D>;
}

#[derive(Debug, Clone)]
pub struct MemoryDefinitionManager<D> {
    definitions: HashMap<(Uuid, Culture), D>,
}

impl<D> Default for MemoryDefinitionManager<D> {
    fn default() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }
}

impl<D: Definition> MemoryDefinitionManager<D> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_definition(mut self, culture: Culture, definition: D) -> Self {
        self.definitions
            .insert((definition.id(), culture), definition);
        self
    }

    /// Registers each definition under the invariant culture.
    pub fn invariant<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = D>,
    {
        definitions
            .into_iter()
            .fold(Self::new(), |manager, definition| {
                manager.with_definition(Culture::invariant(), definition)
            })
    }

    #[must_use]
    pub fn shared(self) -> Arc<dyn DefinitionManager<D>> {
        Arc::new(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl<D: Definition> DefinitionManager<D> for MemoryDefinitionManager<D> {
    fn get(&self, id: Uuid, culture: &Culture) -> Option<D> {
        self.definitions.get(&(id, culture.clone())).cloned()
    }
}
