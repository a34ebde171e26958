//! This module defines [`AggregateBuilder`], the only way to construct an [`Aggregate`].

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    aggregate::{Aggregate, SwitchTable},
    opts::AggregateOpts,
    pool::{GroupPool, MAX_GROUPS},
    types::{DatapathId, Gateway, Node, Server},
};

/// A staged aggregate.
///
/// Every `add_*` method is idempotent. Adding a switch, root switch, or server also starts
/// tracking the connection state of the node involved, and adding a leaf switch gives it a full
/// group pool.
#[derive(Debug, Clone, Default)]
pub struct AggregateBuilder {
    name: Option<String>,
    description: Option<String>,
    ingress_gateways: Vec<Gateway>,
    egress_gateways: Vec<Gateway>,
    root_switches: Vec<Node>,
    switches: Vec<Node>,
    servers: Vec<Server>,
    pools: FxHashMap<Node, GroupPool>,
    connected: FxHashMap<Node, bool>,
    opts: AggregateOpts,
}

impl AggregateBuilder {
    /// Creates an empty builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder. `opts` decides the capacity of every pool this builder creates.
    pub fn with_opts(opts: AggregateOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn add_ingress_gateway(&mut self, gateway: Gateway) -> &mut Self {
        push_unique(&mut self.ingress_gateways, gateway);
        self
    }

    pub fn add_egress_gateway(&mut self, gateway: Gateway) -> &mut Self {
        push_unique(&mut self.egress_gateways, gateway);
        self
    }

    /// Adds a leaf switch. The switch gets a full group pool unless it already has one.
    pub fn add_switch(&mut self, node: Node) -> &mut Self {
        let capacity = self.opts.group_capacity;
        self.pools
            .entry(node.clone())
            .or_insert_with(|| GroupPool::new(capacity));
        self.track(&node);
        push_unique(&mut self.switches, node);
        self
    }

    pub fn add_root_switch(&mut self, node: Node) -> &mut Self {
        self.track(&node);
        push_unique(&mut self.root_switches, node);
        self
    }

    /// Adds a server and tracks the connection state of its OVS node.
    pub fn add_server(&mut self, server: Server) -> &mut Self {
        self.track(server.ovs_node());
        push_unique(&mut self.servers, server);
        self
    }

    pub fn add_ingress_gateways(&mut self, gateways: impl IntoIterator<Item = Gateway>) -> &mut Self {
        for gateway in gateways {
            self.add_ingress_gateway(gateway);
        }
        self
    }

    pub fn add_egress_gateways(&mut self, gateways: impl IntoIterator<Item = Gateway>) -> &mut Self {
        for gateway in gateways {
            self.add_egress_gateway(gateway);
        }
        self
    }

    pub fn add_switches(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
        for node in nodes {
            self.add_switch(node);
        }
        self
    }

    pub fn add_root_switches(&mut self, nodes: impl IntoIterator<Item = Node>) -> &mut Self {
        for node in nodes {
            self.add_root_switch(node);
        }
        self
    }

    pub fn add_servers(&mut self, servers: impl IntoIterator<Item = Server>) -> &mut Self {
        for server in servers {
            self.add_server(server);
        }
        self
    }

    /// Replaces the ingress gateways.
    pub fn set_ingress_gateways(&mut self, gateways: impl IntoIterator<Item = Gateway>) -> &mut Self {
        self.ingress_gateways.clear();
        self.add_ingress_gateways(gateways)
    }

    /// Replaces the egress gateways.
    pub fn set_egress_gateways(&mut self, gateways: impl IntoIterator<Item = Gateway>) -> &mut Self {
        self.egress_gateways.clear();
        self.add_egress_gateways(gateways)
    }

    /// Builds the aggregate. Every tracked switch starts out unflushed.
    ///
    /// Correctness properties:
    ///
    /// - The name and the description must be set.
    /// - The group capacity must be in `1..=MAX_GROUPS`.
    /// - Every tracked node must have a unique datapath ID.
    pub fn build(&self) -> Result<Aggregate, BuildError> {
        // CORRECTNESS: Group identifiers never leave `1..=MAX_GROUPS`.
        let capacity = self.opts.group_capacity;
        if !(1..=MAX_GROUPS).contains(&capacity) {
            return Err(BuildError::InvalidCapacity(capacity));
        }
        let name = self.name.clone().ok_or(BuildError::Incomplete("name"))?;
        let description = self
            .description
            .clone()
            .ok_or(BuildError::Incomplete("description"))?;
        let mut index: FxHashMap<DatapathId, Node> = FxHashMap::default();
        for node in self.tracked_nodes() {
            match index.get(&node.dpid) {
                Some(first) if first == node => {}
                // CORRECTNESS: Every tracked node must have a unique datapath ID.
                Some(first) => {
                    return Err(BuildError::ConflictingDatapathId {
                        dpid: node.dpid,
                        first: first.clone(),
                        second: node.clone(),
                    })
                }
                None => {
                    index.insert(node.dpid, node.clone());
                }
            }
        }
        let connected = self
            .connected
            .iter()
            .map(|(node, &connected)| (node.dpid, connected));
        let table = SwitchTable::new(connected, self.pools.clone());
        Ok(Aggregate {
            name,
            description,
            ingress_gateways: self.ingress_gateways.clone(),
            egress_gateways: self.egress_gateways.clone(),
            root_switches: self.root_switches.clone(),
            switches: self.switches.clone(),
            servers: self.servers.clone(),
            opts: self.opts,
            index,
            table: Mutex::new(table),
        })
    }

    fn track(&mut self, node: &Node) {
        if !self.connected.contains_key(node) {
            self.connected.insert(node.clone(), false);
        }
    }

    // Roots first, then leaves, then server attachments
    fn tracked_nodes(&self) -> impl Iterator<Item = &Node> {
        self.root_switches
            .iter()
            .chain(self.switches.iter())
            .chain(self.servers.iter().map(Server::ovs_node))
    }
}

impl From<&Aggregate> for AggregateBuilder {
    fn from(aggregate: &Aggregate) -> Self {
        let table = aggregate.table.lock();
        let connected = table
            .states
            .iter()
            .filter_map(|(dpid, state)| {
                let node = aggregate.index.get(dpid)?;
                Some((node.clone(), state.connected))
            })
            .collect();
        Self {
            name: Some(aggregate.name.clone()),
            description: Some(aggregate.description.clone()),
            ingress_gateways: aggregate.ingress_gateways.clone(),
            egress_gateways: aggregate.egress_gateways.clone(),
            root_switches: aggregate.root_switches.clone(),
            switches: aggregate.switches.clone(),
            servers: aggregate.servers.clone(),
            pools: table.pools.clone(),
            connected,
            opts: aggregate.opts,
        }
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Aggregate construction error.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A required field was never set.
    #[error("incomplete aggregate builder: `{0}` is not set")]
    Incomplete(&'static str),

    /// The group capacity is outside `1..=MAX_GROUPS`.
    #[error("group capacity {0} is outside 1..={}", MAX_GROUPS)]
    InvalidCapacity(u32),

    /// Two different nodes claim the same datapath ID.
    #[error("datapath ID {dpid} is claimed by both {first} and {second}")]
    ConflictingDatapathId {
        /// The contested datapath ID.
        dpid: DatapathId,
        /// The node seen first.
        first: Node,
        /// The conflicting node.
        second: Node,
    },
}
