//! Utilities for provisioning aggregates from description files and replaying switch events.

#![warn(unreachable_pub, missing_debug_implementations, missing_docs)]

use std::path::{Path, PathBuf};

use log::debug;
use slicekeep_core::{
    Aggregate, AggregateBuilder, AggregateOpts, BuildError, DatapathId, Gateway, Node, Server,
};

/// Reads an [`Aggregate`] from a file containing an [`AggregateSpec`] in JSON or Dhall format.
pub fn read_aggregate(path: impl AsRef<Path>) -> Result<Aggregate, Error> {
    let spec = read_aggregate_spec(path)?;
    Ok(spec.into_builder().build()?)
}

/// Reads an [`AggregateSpec`] from a file in JSON or Dhall format.
pub fn read_aggregate_spec(path: impl AsRef<Path>) -> Result<AggregateSpec, Error> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let spec: AggregateSpec = match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)?,
        Some("dhall") => serde_dhall::from_str(&contents).parse().map_err(Box::new)?,
        _ => return Err(Error::UnknownFileType(path.as_ref().into())),
    };
    debug!("read aggregate spec {} from {}", spec.name, path.as_ref().display());
    Ok(spec)
}

/// Reads [`SwitchEvent`]s from a file in JSON format.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<SwitchEvent>, Error> {
    let events: Vec<SwitchEvent> = match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("json") => {
            let contents = std::fs::read_to_string(path.as_ref())?;
            serde_json::from_str(&contents)?
        }
        _ => return Err(Error::UnknownFileType(path.as_ref().into())),
    };
    Ok(events)
}

/// Applies `event` to `aggregate`. Returns false if the aggregate does not track the switch.
pub fn apply_event(aggregate: &Aggregate, event: &SwitchEvent) -> bool {
    match event.kind {
        SwitchEventKind::Connected => aggregate.switch_connected(event.dpid),
        SwitchEventKind::Disconnected => aggregate.switch_disconnected(event.dpid),
        SwitchEventKind::Flushed => aggregate.switch_flushed(event.dpid),
    }
}

/// A description of an aggregate as handed over by provisioning.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AggregateSpec {
    /// Aggregate name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Ingress gateways.
    #[serde(default)]
    pub ingress: Vec<Gateway>,
    /// Egress gateways.
    #[serde(default)]
    pub egress: Vec<Gateway>,
    /// Root switches.
    #[serde(default)]
    pub root_switches: Vec<Node>,
    /// Leaf switches.
    #[serde(default)]
    pub switches: Vec<Node>,
    /// Servers.
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Group pool capacity of each leaf switch, at most `MAX_GROUPS`.
    #[serde(default)]
    pub group_capacity: Option<u32>,
    /// Clear flush flags on reconnect.
    #[serde(default)]
    pub reset_flush_on_connect: bool,
}

impl AggregateSpec {
    /// Turns the description into a builder, ready to be extended or built.
    pub fn into_builder(self) -> AggregateBuilder {
        let opts = AggregateOpts {
            group_capacity: self
                .group_capacity
                .unwrap_or_else(|| AggregateOpts::default().group_capacity),
            reset_flush_on_connect: self.reset_flush_on_connect,
        };
        let mut builder = AggregateBuilder::with_opts(opts);
        builder
            .name(self.name)
            .description(self.description)
            .add_ingress_gateways(self.ingress)
            .add_egress_gateways(self.egress)
            .add_root_switches(self.root_switches)
            .add_switches(self.switches)
            .add_servers(self.servers);
        builder
    }
}

/// A switch event from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwitchEvent {
    /// What happened.
    pub kind: SwitchEventKind,
    /// The switch it happened to.
    pub dpid: DatapathId,
}

/// Switch event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchEventKind {
    /// The control channel came up.
    Connected,
    /// The control channel went down.
    Disconnected,
    /// The switch's forwarding state was reinitialized.
    Flushed,
}

/// Error kinds for description files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown file type.
    #[error("unknown file type: {0}")]
    UnknownFileType(PathBuf),

    /// Error deserializing Dhall.
    #[error("Dhall error")]
    Dhall(#[from] Box<serde_dhall::Error>),

    /// Error deserializing JSON.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// The description does not form a valid aggregate.
    #[error("invalid aggregate")]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use slicekeep_core::GroupId;

    use super::*;

    const SLICE: &str = r#"{
        "name": "slice-1",
        "description": "single leaf slice",
        "ingress": [{ "name": "gw-in", "node": { "name": "ovs-root", "dpid": 100 } }],
        "root_switches": [{ "name": "ovs-root", "dpid": 100 }],
        "switches": [{ "name": "ovs-1", "dpid": 1 }],
        "servers": [{ "name": "vlc-1", "ovs_node": { "name": "ovs-1", "dpid": 1 } }]
    }"#;

    fn write_file(suffix: &str, contents: &str) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        file.write_all(contents.as_bytes())?;
        Ok(file)
    }

    #[test]
    fn reads_json_aggregate() -> anyhow::Result<()> {
        let file = write_file(".json", SLICE)?;
        let aggregate = read_aggregate(file.path())?;
        assert_eq!(aggregate.name(), "slice-1");
        assert_eq!(aggregate.tracked_switches().len(), 2);
        assert!(aggregate.egress_gateways().is_empty());
        let leaf = &aggregate.switches()[0];
        assert_eq!(aggregate.available_group(leaf), Some(GroupId::new(1)));
        Ok(())
    }

    #[test]
    fn reads_dhall_aggregate() -> anyhow::Result<()> {
        let contents = r#"
            { name = "slice-1"
            , description = "single leaf slice"
            , root_switches = [ { name = "ovs-root", dpid = 100 } ]
            , switches = [ { name = "ovs-1", dpid = 1 } ]
            , servers = [ { name = "vlc-1", ovs_node = { name = "ovs-1", dpid = 1 } } ]
            }
        "#;
        let file = write_file(".dhall", contents)?;
        let aggregate = read_aggregate(file.path())?;
        assert_eq!(aggregate.name(), "slice-1");
        assert_eq!(aggregate.root_switches().len(), 1);
        assert_eq!(aggregate.servers().len(), 1);
        assert!(aggregate.ingress_gateways().is_empty());
        let leaf = &aggregate.switches()[0];
        assert_eq!(leaf.dpid, DatapathId::new(1));
        assert_eq!(aggregate.peek_groups(leaf).map(|groups| groups.len()), Some(10));
        Ok(())
    }

    #[test]
    fn out_of_range_capacity_fails_to_build() -> anyhow::Result<()> {
        let mut spec: AggregateSpec = serde_json::from_str(SLICE)?;
        spec.group_capacity = Some(50);
        assert!(matches!(
            spec.into_builder().build(),
            Err(BuildError::InvalidCapacity(50))
        ));
        Ok(())
    }

    #[test]
    fn spec_options_reach_the_aggregate() -> anyhow::Result<()> {
        let mut spec: AggregateSpec = serde_json::from_str(SLICE)?;
        spec.group_capacity = Some(2);
        spec.reset_flush_on_connect = true;
        let aggregate = spec.into_builder().build()?;
        assert!(aggregate.opts().reset_flush_on_connect);
        let leaf = &aggregate.switches()[0];
        assert_eq!(aggregate.peek_groups(leaf).map(|groups| groups.len()), Some(2));
        Ok(())
    }

    #[test]
    fn unknown_extension_fails() -> anyhow::Result<()> {
        let file = write_file(".yaml", SLICE)?;
        assert!(matches!(
            read_aggregate(file.path()),
            Err(Error::UnknownFileType(..))
        ));
        Ok(())
    }

    #[test]
    fn missing_description_fails() -> anyhow::Result<()> {
        let file = write_file(".json", r#"{ "name": "slice-1" }"#)?;
        assert!(matches!(read_aggregate(file.path()), Err(Error::Json(..))));
        Ok(())
    }

    #[test]
    fn conflicting_switches_fail_to_build() -> anyhow::Result<()> {
        let contents = r#"{
            "name": "slice-1",
            "description": "conflict",
            "root_switches": [{ "name": "ovs-root", "dpid": 1 }],
            "switches": [{ "name": "ovs-1", "dpid": 1 }]
        }"#;
        let file = write_file(".json", contents)?;
        assert!(matches!(
            read_aggregate(file.path()),
            Err(Error::Build(BuildError::ConflictingDatapathId { .. }))
        ));
        Ok(())
    }

    #[test]
    fn replays_events() -> anyhow::Result<()> {
        let events = r#"[
            { "kind": "connected", "dpid": 100 },
            { "kind": "connected", "dpid": 1 },
            { "kind": "flushed", "dpid": 1 },
            { "kind": "connected", "dpid": 999 }
        ]"#;
        let file = write_file(".json", events)?;
        let events = read_events(file.path())?;
        assert_eq!(events.len(), 4);
        let aggregate = serde_json::from_str::<AggregateSpec>(SLICE)?
            .into_builder()
            .build()?;
        let applied = events
            .iter()
            .filter(|event| apply_event(&aggregate, event))
            .count();
        assert_eq!(applied, 3);
        assert!(aggregate.all_switches_connected());
        assert!(aggregate.has_been_flushed(DatapathId::new(1)));
        assert!(!aggregate.has_been_flushed(DatapathId::new(100)));
        Ok(())
    }
}
