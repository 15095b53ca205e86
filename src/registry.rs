use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use tracing::debug;

use crate::action::Action;
use crate::error::StoreError;
use crate::value::StateValue;

/// Internal holder binding one state type to its current value.
///
/// Created by the first `provide` for the type, replaced in place by
/// `dispatch`, never removed.
pub(crate) struct Container {
    value: StateValue,
}

/// The state registry: at most one [`Container`] per distinct state type.
///
/// All mutations run on the store's update queue; the inner lock only makes
/// the plain reads (`get`, `contains`) sound against those mutations.
pub(crate) struct StateRegistry {
    containers: RwLock<HashMap<TypeId, Container>>,
}

impl StateRegistry {
    pub(crate) fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
        }
    }

    /// First write for a type wins: inserting an already-present type is a
    /// silent no-op. Returns the value only when it was actually inserted.
    pub(crate) fn insert(&self, type_id: TypeId, value: StateValue) -> Option<StateValue> {
        let mut containers = self.containers.write().unwrap();
        match containers.entry(type_id) {
            Entry::Occupied(_) => {
                debug!(?type_id, "provide ignored: container already exists");
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(Container {
                    value: value.clone(),
                });
                Some(value)
            }
        }
    }

    /// Current value for the type, or `None` if never provided.
    pub(crate) fn get(&self, type_id: TypeId) -> Option<StateValue> {
        let containers = self.containers.read().unwrap();
        containers.get(&type_id).map(|c| c.value.clone())
    }

    /// Apply an action's reduce step to its target container.
    ///
    /// Absent container: the action is silently dropped (`Ok(None)`).
    /// The reduce and the replacement happen under one write lock, so other
    /// registry operations observe either the old or the new value. On a
    /// reducer error nothing is replaced.
    pub(crate) fn reduce<A: Action>(&self, action: &A) -> Result<Option<StateValue>, StoreError> {
        let mut containers = self.containers.write().unwrap();
        let Some(container) = containers.get_mut(&TypeId::of::<A::State>()) else {
            debug!("dispatch dropped: no container for target state type");
            return Ok(None);
        };
        let Some(current) = container.value.downcast_arc::<A::State>() else {
            return Ok(None);
        };
        let next = action.reduce(&current)?;
        let value = StateValue::new(next);
        container.value = value.clone();
        Ok(Some(value))
    }

    pub(crate) fn contains(&self, type_id: TypeId) -> bool {
        let containers = self.containers.read().unwrap();
        containers.contains_key(&type_id)
    }

    /// Number of distinct state types currently held.
    pub(crate) fn len(&self) -> usize {
        let containers = self.containers.read().unwrap();
        containers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
