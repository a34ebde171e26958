//! This module defines the [`Aggregate`], the bookkeeping state of one tenant slice: its
//! membership, the connect and flush flags of every tracked switch, and the group pools of its leaf
//! switches.

use std::fmt;

use itertools::Itertools;
use log::{debug, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    builder::AggregateBuilder,
    opts::AggregateOpts,
    pool::GroupPool,
    types::{DatapathId, Gateway, GroupId, Node, Server, SwitchState},
};

/// The state tracker for one tenant slice.
///
/// Membership is fixed once the aggregate is built. The switch flags and the group pools are
/// guarded by a single lock, so the aggregate can be shared behind an `Arc` between switch-event
/// handlers and flow installation.
#[derive(Debug)]
pub struct Aggregate {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) ingress_gateways: Vec<Gateway>,
    pub(crate) egress_gateways: Vec<Gateway>,
    pub(crate) root_switches: Vec<Node>,
    pub(crate) switches: Vec<Node>,
    pub(crate) servers: Vec<Server>,
    pub(crate) opts: AggregateOpts,
    // Every tracked node by datapath ID
    pub(crate) index: FxHashMap<DatapathId, Node>,
    pub(crate) table: Mutex<SwitchTable>,
}

/// Everything that changes after an aggregate is built.
#[derive(Debug, Clone, Default)]
pub(crate) struct SwitchTable {
    pub(crate) states: FxHashMap<DatapathId, SwitchState>,
    pub(crate) pools: FxHashMap<Node, GroupPool>,
}

impl SwitchTable {
    /// Creates a table where every tracked switch starts out unflushed.
    pub(crate) fn new(
        connected: impl IntoIterator<Item = (DatapathId, bool)>,
        pools: FxHashMap<Node, GroupPool>,
    ) -> Self {
        let states = connected
            .into_iter()
            .map(|(dpid, connected)| {
                let state = SwitchState {
                    connected,
                    flushed: false,
                };
                (dpid, state)
            })
            .collect();
        Self { states, pools }
    }

    fn connections(&self) -> FxHashMap<DatapathId, bool> {
        self.states
            .iter()
            .map(|(&dpid, state)| (dpid, state.connected))
            .collect()
    }
}

impl Aggregate {
    /// Creates a builder for a new aggregate.
    pub fn builder() -> AggregateBuilder {
        AggregateBuilder::new()
    }

    /// Creates a builder pre-populated with this aggregate's membership, connection flags, and a
    /// copy of its group pools. Aggregates built from it do not share state with `self`.
    pub fn to_builder(&self) -> AggregateBuilder {
        AggregateBuilder::from(self)
    }

    /// Get a reference to the aggregate's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the aggregate's description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the aggregate's options.
    pub fn opts(&self) -> AggregateOpts {
        self.opts
    }

    pub fn ingress_gateways(&self) -> Vec<Gateway> {
        self.ingress_gateways.clone()
    }

    pub fn egress_gateways(&self) -> Vec<Gateway> {
        self.egress_gateways.clone()
    }

    /// Returns the leaf switches, the ones with a group pool.
    pub fn switches(&self) -> Vec<Node> {
        self.switches.clone()
    }

    pub fn root_switches(&self) -> Vec<Node> {
        self.root_switches.clone()
    }

    pub fn servers(&self) -> Vec<Server> {
        self.servers.clone()
    }

    /// Returns every switch whose connection state this aggregate tracks, ordered by datapath ID.
    pub fn tracked_switches(&self) -> Vec<Node> {
        self.index
            .values()
            .cloned()
            .sorted_by_key(|node| node.dpid)
            .collect()
    }

    /// Returns the tracked switch with datapath ID `dpid`.
    pub fn switch(&self, dpid: DatapathId) -> Option<&Node> {
        self.index.get(&dpid)
    }

    /// Returns true if the switch with datapath ID `dpid` belongs to this aggregate.
    pub fn tracks(&self, dpid: DatapathId) -> bool {
        self.index.contains_key(&dpid)
    }

    /// Takes a free group identifier from `node`'s pool. Returns `None` if `node` is not a leaf
    /// switch of this aggregate or if its pool is exhausted.
    pub fn available_group(&self, node: &Node) -> Option<GroupId> {
        let mut table = self.table.lock();
        let pool = table.pools.get_mut(node)?;
        let group = pool.allocate();
        match group {
            Some(group) => debug!("[{}] allocated group {group} on {node}", self.name),
            None => warn!("[{}] no free groups left on {node}", self.name),
        }
        group
    }

    /// Returns `group` to `node`'s pool. Does nothing if `node` is not a leaf switch of this
    /// aggregate or if `group` is already free.
    pub fn return_group(&self, group: GroupId, node: &Node) {
        let mut table = self.table.lock();
        let Some(pool) = table.pools.get_mut(node) else {
            return;
        };
        if pool.release(group) {
            debug!("[{}] returned group {group} on {node}", self.name);
        } else {
            warn!("[{}] dropped return of group {group} on {node}", self.name);
        }
    }

    /// Returns a copy of the free groups on `node` in allocation order, or `None` if `node` has
    /// no pool. Use [`Aggregate::available_group`] to actually claim one.
    pub fn peek_groups(&self, node: &Node) -> Option<Vec<GroupId>> {
        self.table.lock().pools.get(node).map(GroupPool::peek)
    }

    pub fn is_connected(&self, dpid: DatapathId) -> bool {
        self.switch_state(dpid).map_or(false, |state| state.connected)
    }

    pub fn has_been_flushed(&self, dpid: DatapathId) -> bool {
        self.switch_state(dpid).map_or(false, |state| state.flushed)
    }

    /// Returns the flags of the switch with datapath ID `dpid`, if it is tracked.
    pub fn switch_state(&self, dpid: DatapathId) -> Option<SwitchState> {
        self.table.lock().states.get(&dpid).copied()
    }

    /// Returns true if every tracked switch is connected.
    pub fn all_switches_connected(&self) -> bool {
        self.table.lock().states.values().all(|state| state.connected)
    }

    /// Marks a switch as connected. The flush flag is left alone unless
    /// [`AggregateOpts::reset_flush_on_connect`] is set. Returns false if the switch is not
    /// tracked.
    pub fn switch_connected(&self, dpid: DatapathId) -> bool {
        let reset_flush = self.opts.reset_flush_on_connect;
        self.update(dpid, "connected", |state| {
            state.connected = true;
            if reset_flush {
                state.flushed = false;
            }
        })
    }

    /// Marks a switch as disconnected. Returns false if the switch is not tracked.
    pub fn switch_disconnected(&self, dpid: DatapathId) -> bool {
        self.update(dpid, "disconnected", |state| state.connected = false)
    }

    /// Records that a switch's forwarding state has been flushed. Returns false if the switch is
    /// not tracked.
    pub fn switch_flushed(&self, dpid: DatapathId) -> bool {
        self.update(dpid, "flushed", |state| state.flushed = true)
    }

    /// Clears a switch's flush flag so the next setup pass flushes it again. Returns false if the
    /// switch is not tracked.
    pub fn reset_flushed(&self, dpid: DatapathId) -> bool {
        self.update(dpid, "flush reset", |state| state.flushed = false)
    }

    fn update(&self, dpid: DatapathId, event: &str, f: impl FnOnce(&mut SwitchState)) -> bool {
        let Some(node) = self.index.get(&dpid) else {
            debug!("[{}] ignoring {event} for untracked switch {dpid}", self.name);
            return false;
        };
        let mut table = self.table.lock();
        let Some(state) = table.states.get_mut(&dpid) else {
            return false;
        };
        f(&mut *state);
        debug!("[{}] {node} {event}: {state:?}", self.name);
        true
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={}, description={}, ingress-gw=[{}], egress-gw=[{}], roots=[{}], switches=[{}], servers=[{}]",
            self.name,
            self.description,
            self.ingress_gateways.iter().join(", "),
            self.egress_gateways.iter().join(", "),
            self.root_switches.iter().join(", "),
            self.switches.iter().join(", "),
            self.servers.iter().join(", "),
        )
    }
}

// Flush flags are not part of an aggregate's identity.
impl PartialEq for Aggregate {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.name != other.name
            || self.description != other.description
            || self.ingress_gateways != other.ingress_gateways
            || self.egress_gateways != other.egress_gateways
            || self.root_switches != other.root_switches
            || self.switches != other.switches
            || self.servers != other.servers
        {
            return false;
        }
        // Never hold both locks at once.
        let (pools, connections) = {
            let table = self.table.lock();
            (table.pools.clone(), table.connections())
        };
        let table = other.table.lock();
        pools == table.pools && connections == table.connections()
    }
}

impl Eq for Aggregate {}
