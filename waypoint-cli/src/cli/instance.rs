//! Workflow instance CLI commands

use clap::Subcommand;

#[derive(Subcommand)]
pub enum InstanceCommands {
    /// Start a new instance of a workflow definition
    Start {
        /// Definition ID
        definition_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List workflow instances
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show an instance with its history and available actions
    Status {
        /// Instance ID
        instance_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Execute an action on an instance
    Execute {
        /// Instance ID
        instance_id: String,

        /// Action ID
        action_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Delete an instance
    Delete {
        /// Instance ID
        instance_id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}
