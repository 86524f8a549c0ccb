use crate::config::{GeneratorConfig, NetworkClass, NetworkSpec};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a generator configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<GeneratorConfig> {
    info!("Loading generator configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration {}", config_path.display()))?;

    let config: GeneratorConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration {}", config_path.display()))?;

    config.validate()?;

    info!(
        "Configuration has {} LAN and {} DMZ network(s)",
        config.networks_of(NetworkClass::Lan).count(),
        config.networks_of(NetworkClass::Dmz).count()
    );
    Ok(config)
}

/// Inline network lists given on the command line
#[derive(Debug, Clone, Default)]
pub struct InlineNetworks {
    pub lans: Option<String>,
    pub dmzs: Option<String>,
}

/// Build a configuration from the compact list syntax, on top of `base`
pub fn config_from_lists(base: GeneratorConfig, inline: &InlineNetworks) -> Result<GeneratorConfig> {
    let mut config = base;
    if let Some(lans) = &inline.lans {
        config.networks.extend(NetworkSpec::parse_list(lans, NetworkClass::Lan)?);
    }
    if let Some(dmzs) = &inline.dmzs {
        config.networks.extend(NetworkSpec::parse_list(dmzs, NetworkClass::Dmz)?);
    }

    config.validate()?;
    Ok(config)
}
