mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::handlers::{self, Overrides};
use waypoint_core::models::PersistenceKind;

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version)]
#[command(about = "Finite-state workflow engine with an HTTP API")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    /// Path to configuration file (default: ~/.config/waypoint/config.toml)
    #[arg(long, global = true)]
    config_file: Option<String>,

    /// Directory holding definitions.json and instances.json
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the workflow HTTP server
    ///
    /// Examples:
    ///   waypoint serve
    ///   waypoint serve --port 9000 --persistence memory
    ///   waypoint serve --data-dir /var/lib/waypoint
    Serve {
        /// Server bind address
        #[arg(long)]
        host: Option<String>,

        /// Server port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend (file, memory)
        #[arg(long)]
        persistence: Option<PersistenceKind>,
    },

    /// Workflow definition commands
    Workflow {
        #[command(subcommand)]
        command: cli::workflow::WorkflowCommands,
    },

    /// Workflow instance commands
    Instance {
        #[command(subcommand)]
        command: cli::instance::InstanceCommands,
    },

    /// Manage waypoint configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_file = cli.config_file.as_deref();

    let overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        ..Overrides::default()
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            persistence,
        } => {
            let overrides = Overrides {
                host,
                port,
                persistence,
                ..overrides
            };
            let config = handlers::load_configuration(config_file, &overrides)?;
            handlers::init_logging(&config)?;
            handlers::handle_serve(config).await?;
        }
        Commands::Workflow { command } => {
            use cli::workflow::WorkflowCommands;
            use cli::workflow_handlers;

            match command {
                WorkflowCommands::Create {
                    workflow_file,
                    json,
                } => {
                    let orchestrator = handlers::local_orchestrator(config_file, &overrides)?;
                    workflow_handlers::handle_workflow_create(&orchestrator, workflow_file, json)
                        .await?;
                }
                WorkflowCommands::List { json } => {
                    let orchestrator = handlers::local_orchestrator(config_file, &overrides)?;
                    workflow_handlers::handle_workflow_list(&orchestrator, json).await?;
                }
                WorkflowCommands::Show { definition_id, json } => {
                    let orchestrator = handlers::local_orchestrator(config_file, &overrides)?;
                    workflow_handlers::handle_workflow_show(&orchestrator, definition_id, json)
                        .await?;
                }
                WorkflowCommands::Delete { definition_id, json } => {
                    let orchestrator = handlers::local_orchestrator(config_file, &overrides)?;
                    workflow_handlers::handle_workflow_delete(&orchestrator, definition_id, json)
                        .await?;
                }
                WorkflowCommands::Validate {
                    workflow_file,
                    json,
                } => {
                    workflow_handlers::handle_workflow_validate(workflow_file, json)?;
                }
            }
        }
        Commands::Instance { command } => {
            use cli::instance_handlers;

            let orchestrator = handlers::local_orchestrator(config_file, &overrides)?;
            instance_handlers::handle_instance_commands(&orchestrator, command).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Init { force } => {
                handlers::handle_config_init(config_file, force)?;
            }
            ConfigCommands::Show => {
                handlers::handle_config_show(config_file, &overrides)?;
            }
        },
    }

    Ok(())
}
