//! Descriptors for the switches, gateways, and servers that make up an aggregate. The core only
//! references these; it never owns the devices they describe.

use std::fmt;

identifier!(DatapathId, u64);
identifier!(GroupId, u32);

/// A physical switch, identified by its datapath ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// Human-readable switch name.
    pub name: String,
    /// Datapath ID assigned by the switch.
    pub dpid: DatapathId,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.dpid)
    }
}

/// An ingress or egress boundary of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct Gateway {
    /// Gateway name.
    pub name: String,
    /// The switch the gateway sits on.
    pub node: Node,
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.node)
    }
}

/// A tenant workload attached to an OVS node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct Server {
    /// Server name.
    pub name: String,
    ovs_node: Node,
}

impl Server {
    /// Get a reference to the node the server is attached to.
    pub fn ovs_node(&self) -> &Node {
        &self.ovs_node
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.ovs_node)
    }
}

/// Connection and flush flags of one tracked switch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwitchState {
    /// The control channel is up.
    pub connected: bool,
    /// Forwarding state was reinitialized.
    pub flushed: bool,
}
