//! Shared CLI plumbing: configuration, logging, serve and config commands

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use waypoint_core::models::{Configuration, PersistenceKind};
use waypoint_core::server::WorkflowServer;
use waypoint_core::workflow::{FileWorkflowStore, WorkflowOrchestrator};

/// Values given on the command line; they win over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub persistence: Option<PersistenceKind>,
    pub data_dir: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut Configuration) {
        if let Some(host) = &self.host {
            config.server_host = host.clone();
        }
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if let Some(persistence) = self.persistence {
            config.persistence = persistence;
        }
        if let Some(dir) = &self.data_dir {
            config.data_directory = PathBuf::from(dir);
        }
    }
}

/// Resolve the configuration file path, expanding a leading `~/`
pub fn resolve_config_path(config_file: Option<&str>) -> Result<PathBuf> {
    match config_file {
        Some(path) if path.starts_with("~/") => {
            let home = std::env::var("HOME")
                .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            Ok(PathBuf::from(path.replacen("~/", &format!("{}/", home), 1)))
        }
        Some(path) => Ok(PathBuf::from(path)),
        None => Configuration::default_config_path()
            .map_err(|e| anyhow::anyhow!("Failed to get default config path: {}", e)),
    }
}

/// Load configuration: file, then `WAYPOINT_*` environment, then flags
pub fn load_configuration(config_file: Option<&str>, overrides: &Overrides) -> Result<Configuration> {
    let config_path = resolve_config_path(config_file)?;
    let mut config = Configuration::load_from_file(&config_path).map_err(|e| {
        anyhow::anyhow!("Failed to load config {}: {}", config_path.display(), e)
    })?;

    config
        .apply_env_overrides()
        .map_err(|e| anyhow::anyhow!("Invalid environment override: {}", e))?;
    overrides.apply(&mut config);

    if let Err(errors) = config.validate() {
        return Err(anyhow::anyhow!(
            "Invalid configuration:\n  {}",
            errors.join("\n  ")
        ));
    }

    Ok(config)
}

/// Install the tracing subscriber at the configured level
pub fn init_logging(config: &Configuration) -> Result<()> {
    waypoint_core::services::logging::init_logging(config.log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Orchestrator for one-shot local commands
///
/// Always backed by the file store so that state outlives the process.
pub fn local_orchestrator(
    config_file: Option<&str>,
    overrides: &Overrides,
) -> Result<WorkflowOrchestrator> {
    let config = load_configuration(config_file, overrides)?;
    init_logging(&config)?;

    let store = FileWorkflowStore::new(&config.data_directory).with_context(|| {
        format!(
            "Failed to open workflow store in {}",
            config.data_directory.display()
        )
    })?;
    Ok(WorkflowOrchestrator::new(Arc::new(store)))
}

/// Handle the 'serve' command
pub async fn handle_serve(config: Configuration) -> Result<()> {
    let store = config
        .build_store()
        .context("Failed to initialize workflow store")?;

    tracing::info!(
        persistence = ?config.persistence,
        data_directory = %config.data_directory.display(),
        "Using workflow store"
    );

    let orchestrator = Arc::new(WorkflowOrchestrator::new(store));
    WorkflowServer::from_config(&config, orchestrator)
        .start()
        .await
}

/// Handle the 'config init' command
pub fn handle_config_init(config_file: Option<&str>, force: bool) -> Result<()> {
    let config_path = resolve_config_path(config_file)?;

    if config_path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Configuration file {} already exists (use --force to overwrite)",
            config_path.display()
        ));
    }

    Configuration::default()
        .save_to_file(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", config_path.display(), e))?;

    println!("✅ Wrote default configuration to {}", config_path.display());
    Ok(())
}

/// Handle the 'config show' command
pub fn handle_config_show(config_file: Option<&str>, overrides: &Overrides) -> Result<()> {
    let config_path = resolve_config_path(config_file)?;
    let config = load_configuration(config_file, overrides)?;

    println!("# {}", config_path.display());
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );
    Ok(())
}
