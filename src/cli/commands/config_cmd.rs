//! Configuration commands.

use console::style;

use crate::config::{user_config_candidates, Config};

/// Print the effective configuration as TOML.
pub async fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} Loaded from {}", style("→").dim(), path.display()),
        None => eprintln!("{} No config file found, using defaults", style("!").yellow()),
    }
    let rendered = config.to_toml().map_err(|e| anyhow::anyhow!(e))?;
    println!("{}", rendered);
    Ok(())
}

/// Print where config files are read from.
pub async fn cmd_config_path(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => println!("{}", path.display()),
        None => {
            println!("{} No config file in use.", style("!").yellow());
            println!("  Create pagesift.toml (or .yaml/.json) in one of:");
            println!("    {}", style("./").dim());
            for dir in user_config_candidates() {
                println!("    {}", style(dir.display()).dim());
            }
        }
    }
    Ok(())
}
