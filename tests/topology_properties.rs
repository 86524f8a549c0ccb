//! End-to-end behavior of the workspace: cascades, pruning, pings, address
//! validation, scoping, generation and persistence.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use netsketch::analysis::PingVerdict;
use netsketch::config::{GeneratorConfig, NetworkClass, NetworkSpec};
use netsketch::generator::GenerateError;
use netsketch::topology::{DeviceRole, LinkOptions, Node, NodeKind, Position, Size, Snapshot};
use netsketch::workspace::{NodeDraft, Workspace};
use tempfile::NamedTempFile;

fn at(x: f64, y: f64) -> Position {
    Position::new(x, y)
}

fn assert_no_dangling_edges(ws: &Workspace) {
    for edge in ws.edges() {
        assert!(ws.node(&edge.source).is_some(), "edge {} lost its source", edge.id);
        assert!(ws.node(&edge.target).is_some(), "edge {} lost its target", edge.id);
    }
}

/// A group holding a switch and two PCs, uplinked to a router
struct Subnet {
    group: String,
    switch: String,
    pcs: [String; 2],
    router: String,
}

fn subnet(ws: &mut Workspace) -> Subnet {
    let router = ws.create_node(NodeDraft::device(DeviceRole::Router, at(400.0, 0.0)));
    let group = ws.create_node(NodeDraft::container(NodeKind::Group, at(0.0, 100.0)).size(Size::new(320.0, 260.0)));
    let switch = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(110.0, 30.0)).inside(&group));
    let pc1 = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(20.0, 150.0)).inside(&group));
    let pc2 = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(190.0, 150.0)).inside(&group));
    ws.connect(&pc1, &switch, LinkOptions::default()).unwrap();
    ws.connect(&pc2, &switch, LinkOptions::default()).unwrap();
    ws.connect(&switch, &router, LinkOptions::default().vlan("10")).unwrap();
    Subnet {
        group,
        switch,
        pcs: [pc1, pc2],
        router,
    }
}

#[test]
fn deleting_a_group_removes_its_members() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    assert!(ws.delete(&net.group));
    for id in [&net.group, &net.switch, &net.pcs[0], &net.pcs[1]] {
        assert!(ws.node(id).is_none(), "{} survived", id);
    }
    assert!(ws.node(&net.router).is_some());
    assert!(ws.edges().is_empty());
    assert_no_dangling_edges(&ws);
}

#[test]
fn deleting_a_contained_switch_takes_the_whole_subnet() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    let outsider = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(900.0, 900.0)));
    assert!(ws.delete(&net.switch));
    let remaining: BTreeSet<&str> = ws.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(remaining, BTreeSet::from([net.router.as_str(), outsider.as_str()]));
    assert_no_dangling_edges(&ws);
}

#[test]
fn deleting_a_plain_device_removes_only_itself() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    let before = ws.nodes().len();
    assert!(ws.delete(&net.pcs[0]));
    assert_eq!(ws.nodes().len(), before - 1);
    assert!(ws.node(&net.group).is_some());
    assert_eq!(ws.edges().len(), 2);
    assert_no_dangling_edges(&ws);

    // undo brings back the host and its link
    assert!(ws.undo());
    assert!(ws.node(&net.pcs[0]).is_some());
    assert_eq!(ws.edges().len(), 3);
}

#[test]
fn deleting_an_edge_by_id() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    let uplink = ws
        .edges()
        .iter()
        .find(|e| e.touches(&net.router))
        .map(|e| e.id.clone())
        .unwrap();
    assert!(ws.delete(&uplink));
    assert!(ws.edge(&uplink).is_none());
    assert_eq!(ws.nodes().len(), 5);
}

#[test]
fn lock_applies_to_the_target_only() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    assert!(ws.toggle_lock(&net.group));
    assert!(ws.node(&net.group).unwrap().locked);
    assert!(!ws.node(&net.switch).unwrap().locked);
}

#[test]
fn detach_rebases_children_to_absolute_positions() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    assert!(ws.detach(&net.group));
    let switch = ws.node(&net.switch).unwrap();
    assert_eq!(switch.parent_id, None);
    assert_eq!(switch.position, at(110.0, 130.0));
    assert_eq!(ws.node(&net.group).unwrap().position, at(0.0, 100.0));
}

#[test]
fn shortest_path_is_minimal_and_stable() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    let first = ws.ping(&net.pcs[0], &net.router);
    let second = ws.ping(&net.pcs[0], &net.router);
    assert_eq!(first, second);
    let route = first.route.unwrap();
    assert_eq!(route.nodes, vec![net.pcs[0].clone(), net.switch.clone(), net.router.clone()]);
}

/// pc-a - sw1 =10= middle =20= sw2 - pc-b
fn two_vlan_chain(middle: DeviceRole) -> (Workspace, String, String) {
    let mut ws = Workspace::new();
    let pc_a = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(0.0, 0.0)));
    let sw1 = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(100.0, 0.0)));
    let mid = ws.create_node(NodeDraft::device(middle, at(200.0, 0.0)));
    let sw2 = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(300.0, 0.0)));
    let pc_b = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(400.0, 0.0)));
    ws.connect(&pc_a, &sw1, LinkOptions::default()).unwrap();
    ws.connect(&sw1, &mid, LinkOptions::default().vlan("10")).unwrap();
    ws.connect(&mid, &sw2, LinkOptions::default().vlan("20")).unwrap();
    ws.connect(&sw2, &pc_b, LinkOptions::default()).unwrap();
    (ws, pc_a, pc_b)
}

#[test]
fn router_exemption_lets_vlans_cross() {
    let (ws, a, b) = two_vlan_chain(DeviceRole::Router);
    let outcome = ws.ping(&a, &b);
    assert_eq!(outcome.verdict, PingVerdict::Reachable);
    assert_eq!(outcome.highlighted_edges().len(), 4);

    let (ws, a, b) = two_vlan_chain(DeviceRole::Switch);
    let outcome = ws.ping(&a, &b);
    assert!(matches!(outcome.verdict, PingVerdict::VlanBlocked { .. }));
    assert_eq!(outcome.verdict.message(), "VLAN/subnet incompatible");
}

#[test]
fn dmz_server_waives_vlan_policy() {
    let mut ws = Workspace::new();
    let sw_a = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(0.0, 0.0)));
    let sw_b = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(200.0, 0.0)));
    let server = ws.create_node(NodeDraft::device(DeviceRole::Server, at(100.0, 0.0)).label("SRV-DMZ"));
    ws.connect(&server, &sw_a, LinkOptions::default().vlan("10")).unwrap();
    ws.connect(&server, &sw_b, LinkOptions::default().vlan("20")).unwrap();
    assert!(ws.ping(&sw_a, &sw_b).verdict.passed());
}

#[test]
fn ping_without_route_is_a_verdict() {
    let mut ws = Workspace::new();
    let a = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(0.0, 0.0)));
    let b = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(1.0, 0.0)));
    let outcome = ws.ping(&a, &b);
    assert_eq!(outcome.verdict, PingVerdict::NoRoute);
    assert_eq!(outcome.verdict.message(), "No physical route");
}

#[test]
fn subnet_validation() {
    let mut ws = Workspace::new();
    let sw = ws.create_node(NodeDraft::device(DeviceRole::Switch, at(0.0, 0.0)).label("SW-A\n192.168.10.0/24"));
    let pc = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(0.0, 100.0)).label("PC\nIP: 192.168.10.50"));
    ws.connect(&pc, &sw, LinkOptions::default()).unwrap();
    assert!(ws.validate().is_empty());

    ws.set_label(&sw, "SW-A\n192.168.20.0/24");
    let warning = ws.validate().get(&pc).cloned().unwrap();
    assert!(warning.contains("192.168.20.0/24"), "{}", warning);

    ws.set_label(&pc, "PC\nIP: DHCP");
    assert!(ws.validate().is_empty());
}

#[test]
fn duplicate_addresses_flag_both_hosts() {
    let mut ws = Workspace::new();
    let a = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(0.0, 0.0)).label("A\nIP: 10.0.0.5"));
    let b = ws.create_node(NodeDraft::device(DeviceRole::Pc, at(1.0, 0.0)).label("B\nIP: 10.0.0.5"));
    let warnings = ws.validate().clone();
    assert!(warnings[&a].starts_with("Duplicate IP 10.0.0.5"));
    assert!(warnings[&b].starts_with("Duplicate IP 10.0.0.5"));

    ws.set_label(&b, "B\nIP: 10.0.0.6");
    assert!(ws.validate().is_empty());
}

#[test]
fn scope_recompute_is_idempotent() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    assert!(ws.set_focus(Some(&net.switch)));
    let revision = ws.store().revision();
    let flags: Vec<(bool, bool)> = ws.nodes().iter().map(|n| (n.hidden, n.focused)).collect();

    assert!(!ws.refresh_scope());
    assert_eq!(ws.store().revision(), revision);
    let again: Vec<(bool, bool)> = ws.nodes().iter().map(|n| (n.hidden, n.focused)).collect();
    assert_eq!(flags, again);
}

#[test]
fn generator_append_stacks_onto_one_core() {
    let mut ws = Workspace::new();
    let lan = |name: &str, third: u8, vlan: u16| {
        NetworkSpec::new(name, NetworkClass::Lan)
            .with_cidr(Ipv4Addr::new(192, 168, third, 0), 24)
            .with_vlan(vlan)
    };
    let first = GeneratorConfig {
        networks: vec![lan("Admin", 10, 10), lan("Users", 20, 20)],
        ..GeneratorConfig::default()
    };
    let report = ws.generate(&first, false).unwrap();
    let tallest_bottom = report
        .groups
        .iter()
        .map(|g| ws.node(g).unwrap().bottom())
        .fold(f64::MIN, f64::max);

    let more = GeneratorConfig {
        networks: vec![lan("Guests", 30, 30)],
        ..GeneratorConfig::default()
    };
    let appended = ws.generate(&more, true).unwrap();
    assert_eq!(appended.central_id, report.central_id);

    let switches: Vec<_> = ws.nodes().iter().filter(|n| n.is_switch_class()).collect();
    assert_eq!(switches.len(), 3);
    for switch in switches {
        assert!(
            ws.edges()
                .iter()
                .any(|e| e.touches(&switch.id) && e.touches(&report.central_id)),
            "{} is not wired to the core",
            switch.id
        );
    }
    let routers = ws.nodes().iter().filter(|n| n.is_router_class()).count();
    assert_eq!(routers, 1);
    assert!(ws.node(&appended.groups[0]).unwrap().position.y > tallest_bottom);

    // generated hosts validate cleanly and the VLAN-crossing ping goes through the router
    assert!(ws.validate().is_empty());
    let admin_pc = &report.hosts[0];
    let guest_pc = &appended.hosts[0];
    assert!(ws.ping(admin_pc, guest_pc).verdict.passed());

    // one undo per generation call
    assert!(ws.undo());
    assert_eq!(ws.nodes().iter().filter(|n| n.is_switch_class()).count(), 2);
}

#[test]
fn failed_generation_leaves_topology_alone() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    let before = ws.snapshot();
    let bad = GeneratorConfig {
        networks: vec![NetworkSpec::new("Tiny", NetworkClass::Lan).with_cidr(Ipv4Addr::new(10, 0, 0, 0), 32)],
        ..GeneratorConfig::default()
    };
    assert!(ws.generate(&bad, true).is_err());
    assert_eq!(ws.snapshot(), before);
    assert!(ws.node(&net.router).is_some());
}

#[test]
fn generation_refuses_to_wrap_loaded_id_counters() {
    let snapshot = Snapshot {
        nodes: vec![Node::device(format!("pc-g{}", u64::MAX), DeviceRole::Pc, "PC-1", at(0.0, 0.0))],
        edges: Vec::new(),
    };
    let mut ws = Workspace::from_snapshot(snapshot);
    let before = ws.snapshot();
    let config = GeneratorConfig {
        networks: vec![NetworkSpec::new("Admin", NetworkClass::Lan)],
        ..GeneratorConfig::default()
    };
    assert!(matches!(ws.generate(&config, true), Err(GenerateError::Ids(_))));
    assert_eq!(ws.snapshot(), before);
}

#[test]
fn save_and_load_round_trip() {
    let mut ws = Workspace::new();
    let net = subnet(&mut ws);
    ws.set_focus(Some(&net.switch));

    let file = NamedTempFile::new().unwrap();
    ws.save(file.path()).unwrap();
    let loaded = Workspace::load(file.path()).unwrap();

    let core = |snapshot: &Snapshot| {
        let nodes: BTreeSet<(String, String, Option<String>)> = snapshot
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.label.clone(), n.parent_id.clone()))
            .collect();
        let edges: BTreeSet<(String, String, String, Option<String>)> = snapshot
            .edges
            .iter()
            .map(|e| (e.id.clone(), e.source.clone(), e.target.clone(), e.vlan.clone()))
            .collect();
        (nodes, edges)
    };
    assert_eq!(core(&loaded.snapshot()), core(&ws.snapshot()));
    assert_eq!(loaded.focus(), None);
    assert!(loaded.nodes().iter().all(|n| !n.hidden));
}

#[test]
fn loading_tolerates_malformed_snapshots() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{"nodes": [{"id": "pc-1", "role": "pc", "label": "PC"}, {"id": 5}], "edges": "oops"}"#,
    )
    .unwrap();
    let ws = Workspace::load(file.path()).unwrap();
    assert_eq!(ws.nodes().len(), 1);
    assert!(ws.edges().is_empty());

    std::fs::write(file.path(), "{}").unwrap();
    assert!(Workspace::load(file.path()).unwrap().nodes().is_empty());

    std::fs::write(file.path(), "[1, 2]").unwrap();
    assert!(Workspace::load(file.path()).is_err());
}
