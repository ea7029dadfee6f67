//! Config Command
//!
//! Usage:
//!   ai-router config show [-f json]
//!   ai-router config path
//!   ai-router config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::{Result, RouterError};

/// Print the effective configuration. API keys are never included.
pub fn show(config: &Config, format: &str) -> Result<()> {
    let rendered = match format {
        "json" => serde_json::to_string_pretty(config)?,
        _ => toml::to_string_pretty(config)
            .map_err(|e| RouterError::Config(format!("Failed to render config: {}", e)))?,
    };
    println!("{}", rendered);

    let configured = config.configured_providers();
    let names: Vec<&str> = configured.iter().map(|p| p.as_str()).collect();
    eprintln!(
        "# configured providers: {}",
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    );
    Ok(())
}

/// Show configuration file locations and whether they exist
pub fn path() -> Result<()> {
    let output = Output::new();
    output.section("Configuration Files");

    match ConfigLoader::global_config_path() {
        Some(path) => output.kv("Global", describe(&path)),
        None => output.kv("Global", "(no config directory on this platform)"),
    }

    let project = ConfigLoader::project_config_path();
    output.kv("Project", describe(&project));
    output.kv("Env prefix", "AI_ROUTER_ (e.g. AI_ROUTER_ROUTING__TIMEOUT_SECS)");
    Ok(())
}

fn describe(path: &std::path::Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let output = Output::new();
    let (path, existed) = if global {
        let existed = ConfigLoader::global_config_path().is_some_and(|p| p.exists());
        (ConfigLoader::init_global(force)?, existed)
    } else {
        let existed = ConfigLoader::project_config_path().exists();
        (ConfigLoader::init_project(force)?, existed)
    };

    if existed && !force {
        output.warning(&format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    } else {
        output.success(&format!("Created {}", path.display()));
    }
    Ok(())
}
