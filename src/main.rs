//! Command line front end for netsketch topologies.
//!
//! Every subcommand works on snapshot JSON files as written by
//! [`Workspace::save`].

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;

use netsketch::config::GeneratorConfig;
use netsketch::config_loader::{self, InlineNetworks};
use netsketch::workspace::Workspace;

/// Network topology sketching toolkit
#[derive(Parser, Debug)]
#[command(name = "netsketch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a topology from a network list
    Generate {
        /// Generator configuration YAML file
        #[arg(short, long, conflicts_with_all = ["lans", "dmzs"])]
        config: Option<PathBuf>,

        /// Inline LAN list, e.g. "Admin 192.168.10.0/24 10, Users 192.168.20.0/24 20"
        #[arg(long)]
        lans: Option<String>,

        /// Inline DMZ list, same syntax as --lans
        #[arg(long)]
        dmzs: Option<String>,

        /// Append to the topology given with --input instead of replacing it
        #[arg(long, requires = "input")]
        append: bool,

        /// Existing topology to extend
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the resulting topology
        #[arg(short, long, default_value = "topology.json")]
        output: PathBuf,
    },

    /// Simulate a ping between two devices
    Ping {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        source: String,

        #[arg(long)]
        target: String,
    },

    /// Check addressing and print one warning per line
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print per-device interface data as JSON
    Interfaces {
        #[arg(short, long)]
        input: PathBuf,

        /// Only this device
        #[arg(long)]
        device: Option<String>,
    },

    /// Print the node ids visible in a scope
    Scope {
        #[arg(short, long)]
        input: PathBuf,

        /// Sub-network to focus; global scope when absent
        #[arg(long)]
        focus: Option<String>,

        #[arg(long)]
        hide_hosts: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::Generate {
            config,
            lans,
            dmzs,
            append,
            input,
            output,
        } => {
            let config = match config {
                Some(path) => config_loader::load_config(&path)?,
                None => config_from_inline(lans, dmzs)?,
            };
            let mut workspace = match &input {
                Some(path) => Workspace::load(path)?,
                None => Workspace::new(),
            };
            let report = workspace
                .generate(&config, append)
                .wrap_err("Topology generation failed")?;
            workspace.save(&output)?;
            info!(
                "Central device {}, {} new group(s), VLANs {:?}",
                report.central_id,
                report.groups.len(),
                report.vlans
            );
            println!("{}", output.display());
        }
        Commands::Ping { input, source, target } => {
            let workspace = Workspace::load(&input)?;
            let outcome = workspace.ping(&source, &target);
            let status = if outcome.verdict.passed() { "PASS" } else { "FAIL" };
            println!("{}: {}", status, outcome.verdict);
            if let Some(route) = &outcome.route {
                println!("route: {}", route.nodes.join(" -> "));
            }
        }
        Commands::Validate { input } => {
            let mut workspace = Workspace::load(&input)?;
            let warnings = workspace.validate();
            if warnings.is_empty() {
                info!("No addressing problems found");
            }
            for (node_id, warning) in warnings {
                println!("{}: {}", node_id, warning);
            }
        }
        Commands::Interfaces { input, device } => {
            let workspace = Workspace::load(&input)?;
            let json = match device {
                Some(id) => {
                    let interfaces = workspace
                        .interfaces(&id)
                        .ok_or_else(|| eyre!("{} is not a router or switch in {}", id, input.display()))?;
                    serde_json::to_string_pretty(&interfaces)?
                }
                None => serde_json::to_string_pretty(&workspace.all_interfaces())?,
            };
            println!("{}", json);
        }
        Commands::Scope {
            input,
            focus,
            hide_hosts,
        } => {
            print_scope(&input, focus.as_deref(), !hide_hosts)?;
        }
    }

    Ok(())
}

fn config_from_inline(lans: Option<String>, dmzs: Option<String>) -> Result<GeneratorConfig> {
    if lans.is_none() && dmzs.is_none() {
        return Err(eyre!("Either --config or at least one of --lans/--dmzs is required"));
    }
    config_loader::config_from_lists(GeneratorConfig::default(), &InlineNetworks { lans, dmzs })
}

fn print_scope(input: &Path, focus: Option<&str>, show_hosts: bool) -> Result<()> {
    let mut workspace = Workspace::load(input)?;
    workspace.set_show_hosts(show_hosts);
    if let Some(id) = focus {
        if !workspace.set_focus(Some(id)) {
            return Err(eyre!("No node {} in {}", id, input.display()));
        }
    }
    for node in workspace.nodes().iter().filter(|n| !n.hidden) {
        println!("{}", node.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args() {
        let cli = Cli::parse_from([
            "netsketch",
            "generate",
            "--lans",
            "Admin 192.168.10.0/24 10",
            "--output",
            "out.json",
        ]);
        match cli.command {
            Commands::Generate { lans, append, output, config, .. } => {
                assert_eq!(lans.as_deref(), Some("Admin 192.168.10.0/24 10"));
                assert!(!append);
                assert!(config.is_none());
                assert_eq!(output, PathBuf::from("out.json"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_append_requires_input() {
        assert!(Cli::try_parse_from(["netsketch", "generate", "--lans", "A", "--append"]).is_err());
        assert!(Cli::try_parse_from(["netsketch", "generate", "--config", "c.yaml", "--lans", "A"]).is_err());
    }

    #[test]
    fn test_ping_args() {
        let cli = Cli::parse_from([
            "netsketch",
            "--log-level",
            "debug",
            "ping",
            "-i",
            "t.json",
            "--source",
            "pc-1",
            "--target",
            "pc-2",
        ]);
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Ping { ref source, .. } if source == "pc-1"));
    }

    #[test]
    fn test_inline_config_requires_networks() {
        assert!(config_from_inline(None, None).is_err());
        let config = config_from_inline(Some("A 10.0.0.0/24".into()), None).unwrap();
        assert_eq!(config.networks.len(), 1);
    }
}
