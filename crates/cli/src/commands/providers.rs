use localdeploy_deploy::{DeployConfig, default_registry};

use crate::OutputFormat;

pub fn run(config: &DeployConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let registry = default_registry(config);
    let keys = registry.keys();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        OutputFormat::Text => {
            println!("{} providers:", keys.len());
            for key in keys {
                println!("  {} (version {})", key.name, key.version);
            }
        }
    }
    Ok(())
}
