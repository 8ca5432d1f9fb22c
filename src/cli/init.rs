//! Init command - write an example project config

use anyhow::{Context, Result};
use console::style;
use repolens::config::{UserConfig, CONFIG_FILE_TOML, EXAMPLE_CONFIG};
use std::path::Path;

pub(crate) fn run(path: &Path, user: bool) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", path.display());
    }

    let config_path = path.join(CONFIG_FILE_TOML);
    if config_path.exists() {
        println!(
            "{} Already initialized at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        std::fs::write(&config_path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to create {}", config_path.display()))?;
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }

    if user {
        let user_path = UserConfig::init_user_config()?;
        println!(
            "{} User config at {}",
            style("✓").green(),
            style(user_path.display()).cyan()
        );
    }

    println!("\nNext steps:");
    println!("  {} Classify repositories", style("repolens classify repos.json").cyan());
    println!("  {} Score their health", style("repolens health repos.json").cyan());

    Ok(())
}
