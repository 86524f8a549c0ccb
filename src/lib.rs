//! # Netsketch - Topology model and reasoning for sketched networks
//!
//! This library provides the logic core behind a network sketching tool:
//! the topology model (devices, containers, links) and the graph algorithms
//! that reason about it.
//!
//! ## Overview
//!
//! A user assembles routers, switches, hosts, firewalls and grouping boxes
//! into a topology. Netsketch keeps that topology consistent under structural
//! edits and answers questions about it without any rendering concerns.
//!
//! ## Key Features
//!
//! - **Cascading edits**: deleting a sub-network switch takes its whole group along,
//!   deleting a group takes its members, dangling links are always pruned
//! - **Simulated ping**: BFS shortest path gated by VLAN continuity, router and DMZ exemptions
//! - **Address validation**: duplicate static IPs, missing addresses, subnet membership
//! - **Scoped views**: global view or a single sub-network's induced subgraph
//! - **Bulk generation**: declarative LAN/DMZ lists expanded into groups, switches and hosts
//!   with deterministic layout and id numbering, replacing or appending
//! - **Linear undo** over bounded snapshots
//!
//! ## Architecture
//!
//! - `topology`: data model, store, cascade engine, history, connection rules
//! - `ip`: label/CIDR parsing, host address derivation, IP ownership registry
//! - `analysis`: path finder, reachability policy, view scope filter
//! - `utils`: address validation
//! - `generator`: bulk topology generation
//! - `export`: per-device interface data for configuration rendering
//! - `config` / `config_loader`: generator input as YAML
//! - `workspace`: the mutation interface wrapping all of the above
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netsketch::{config_loader, workspace::Workspace};
//!
//! let config = config_loader::load_config("networks.yaml".as_ref())?;
//!
//! let mut ws = Workspace::new();
//! ws.generate(&config, false)?;
//! for (node_id, warning) in ws.validate() {
//!     println!("{node_id}: {warning}");
//! }
//! ws.save("topology.json".as_ref())?;
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Domain errors are small `thiserror` enums living next to the code that
//! raises them. File loading and the CLI use `color_eyre` for context-rich
//! reports. Simulation outcomes (ping verdicts, address warnings) are plain
//! values, never errors.

pub mod config;
pub mod config_loader;

pub mod analysis;
pub mod export;
pub mod generator;
pub mod ip;
pub mod topology;
pub mod utils;
pub mod workspace;
