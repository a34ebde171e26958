use crate::{
    aggregate::Aggregate,
    builder::AggregateBuilder,
    opts::AggregateOpts,
    types::{DatapathId, Gateway, Node, Server},
};

pub(crate) fn node(name: &str, dpid: u64) -> Node {
    Node::new(name.to_owned(), DatapathId::new(dpid))
}

/// One root switch (dpid 100) and one leaf switch `ovs-1` (dpid 1) hosting one server.
pub(crate) fn slice_one() -> (Aggregate, Node) {
    let root = node("ovs-root", 100);
    let leaf = node("ovs-1", 1);
    let aggregate = AggregateBuilder::new()
        .name("slice-1")
        .description("single leaf slice")
        .add_ingress_gateway(Gateway::new("gw-in".into(), root.clone()))
        .add_root_switch(root)
        .add_switch(leaf.clone())
        .add_server(Server::new("vlc-1".into(), leaf.clone()))
        .build()
        .unwrap();
    (aggregate, leaf)
}

pub(crate) fn two_tier_builder_with(opts: AggregateOpts) -> AggregateBuilder {
    // 2 roots (dpids 100 and 101), 3 leaves (dpids 1-3), one server per leaf
    let roots = [node("ovs-root-a", 100), node("ovs-root-b", 101)];
    let leaves = (1..=3)
        .map(|i| node(&format!("ovs-{i}"), i))
        .collect::<Vec<_>>();
    let servers = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| Server::new(format!("vlc-{}", i + 1), leaf.clone()))
        .collect::<Vec<_>>();
    let mut builder = AggregateBuilder::with_opts(opts);
    builder
        .name("two-tier")
        .description("two roots over three leaves")
        .add_ingress_gateway(Gateway::new("gw-in".into(), roots[0].clone()))
        .add_egress_gateway(Gateway::new("gw-out".into(), roots[1].clone()))
        .add_root_switches(roots)
        .add_switches(leaves)
        .add_servers(servers);
    builder
}

pub(crate) fn two_tier_aggregate() -> Aggregate {
    two_tier_builder_with(AggregateOpts::default())
        .build()
        .unwrap()
}
