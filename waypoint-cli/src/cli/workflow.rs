//! Workflow definition CLI commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Create a workflow definition from a JSON or YAML file
    Create {
        /// Path to the definition file
        workflow_file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List stored workflow definitions
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one workflow definition
    Show {
        /// Definition ID
        definition_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete a workflow definition
    Delete {
        /// Definition ID
        definition_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate a workflow definition file without storing it
    Validate {
        /// Path to the definition file
        workflow_file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
