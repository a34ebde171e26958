//! This module defines [`SliceRegistry`], which owns every live aggregate by name and fans switch
//! events out to the aggregates that track the switch.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use itertools::Itertools;
use log::{info, warn};

use crate::{aggregate::Aggregate, types::DatapathId};

/// The set of live aggregates, keyed by name.
#[derive(Debug, Default)]
pub struct SliceRegistry {
    aggregates: DashMap<String, Arc<Aggregate>>,
}

impl SliceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `aggregate` under its name. Fails if the name is taken.
    pub fn insert(&self, aggregate: Aggregate) -> Result<Arc<Aggregate>, RegistryError> {
        match self.aggregates.entry(aggregate.name().to_owned()) {
            Entry::Occupied(entry) => Err(RegistryError::Duplicate(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!("registered aggregate {}", aggregate.name());
                let aggregate = Arc::new(aggregate);
                entry.insert(Arc::clone(&aggregate));
                Ok(aggregate)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Aggregate>> {
        self.aggregates
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Tears down the aggregate called `name`. Its state is dropped once the last outstanding
    /// handle goes away.
    pub fn remove(&self, name: &str) -> Option<Arc<Aggregate>> {
        let (_, aggregate) = self.aggregates.remove(name)?;
        info!("removed aggregate {name}");
        Some(aggregate)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.aggregates
            .iter()
            .map(|entry| entry.key().clone())
            .sorted()
            .collect()
    }

    delegate::delegate! {
        to self.aggregates {
            pub fn len(&self) -> usize;
            pub fn is_empty(&self) -> bool;
        }
    }

    /// Applies a connect event to every aggregate tracking `dpid` and returns how many did.
    pub fn switch_connected(&self, dpid: DatapathId) -> usize {
        self.dispatch(dpid, "connect", Aggregate::switch_connected)
    }

    /// Applies a disconnect event to every aggregate tracking `dpid` and returns how many did.
    pub fn switch_disconnected(&self, dpid: DatapathId) -> usize {
        self.dispatch(dpid, "disconnect", Aggregate::switch_disconnected)
    }

    /// Applies a flush event to every aggregate tracking `dpid` and returns how many did.
    pub fn switch_flushed(&self, dpid: DatapathId) -> usize {
        self.dispatch(dpid, "flush", Aggregate::switch_flushed)
    }

    fn dispatch<F>(&self, dpid: DatapathId, event: &str, apply: F) -> usize
    where
        F: Fn(&Aggregate, DatapathId) -> bool,
    {
        let accepted = self
            .aggregates
            .iter()
            .filter(|entry| apply(entry.value().as_ref(), dpid))
            .count();
        if accepted == 0 {
            warn!("{event} event from switch {dpid}, which no aggregate tracks");
        }
        accepted
    }
}

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An aggregate with this name is already registered.
    #[error("aggregate {0} is already registered")]
    Duplicate(String),
}
