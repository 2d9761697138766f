//! Workflow instance command handlers

use crate::cli::instance::InstanceCommands;
use anyhow::Result;
use waypoint_core::models::workflow::{WorkflowDefinition, WorkflowInstance};
use waypoint_core::workflow::{TransitionEngine, WorkflowOrchestrator};

/// Dispatch an instance subcommand
pub async fn handle_instance_commands(
    orchestrator: &WorkflowOrchestrator,
    command: InstanceCommands,
) -> Result<()> {
    match command {
        InstanceCommands::Start {
            definition_id,
            json,
        } => handle_instance_start(orchestrator, definition_id, json).await,
        InstanceCommands::List { json } => handle_instance_list(orchestrator, json).await,
        InstanceCommands::Status { instance_id, json } => {
            handle_instance_status(orchestrator, instance_id, json).await
        }
        InstanceCommands::Execute {
            instance_id,
            action_id,
            json,
        } => handle_instance_execute(orchestrator, instance_id, action_id, json).await,
        InstanceCommands::Delete { instance_id, json } => {
            handle_instance_delete(orchestrator, instance_id, json).await
        }
    }
}

fn state_label(definition: Option<&WorkflowDefinition>, state_id: &str) -> String {
    match definition.and_then(|d| d.state(state_id)) {
        Some(state) if !state.name.is_empty() && state.name != state.id => {
            format!("{} ({})", state.id, state.name)
        }
        _ => state_id.to_string(),
    }
}

fn print_history(instance: &WorkflowInstance) {
    if instance.history.is_empty() {
        println!("  (no actions executed)");
        return;
    }

    for entry in &instance.history {
        println!(
            "  {} -> {} via {} ({}) at {}",
            entry.from_state_id,
            entry.to_state_id,
            entry.action_id,
            entry.action_name,
            entry.executed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

/// Handle instance start command
pub async fn handle_instance_start(
    orchestrator: &WorkflowOrchestrator,
    definition_id: String,
    json: bool,
) -> Result<()> {
    let instance = orchestrator.start_instance(&definition_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        println!("✅ Started instance of workflow {}", definition_id);
        println!("   Instance ID:   {}", instance.id);
        println!("   Current State: {}", instance.current_state_id);
        println!();
        println!(
            "Use 'waypoint instance status {}' to see available actions",
            instance.id
        );
    }

    Ok(())
}

/// Handle instance list command
pub async fn handle_instance_list(orchestrator: &WorkflowOrchestrator, json: bool) -> Result<()> {
    let instances = orchestrator.list_instances().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else if instances.is_empty() {
        println!("No workflow instances.");
    } else {
        println!("Workflow Instances:");
        println!("===================");
        for instance in &instances {
            println!(
                "  • {}  definition={}  state={}  steps={}  updated={}",
                instance.id,
                instance.definition_id,
                instance.current_state_id,
                instance.history.len(),
                instance.last_updated.format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}

/// Handle instance status command
pub async fn handle_instance_status(
    orchestrator: &WorkflowOrchestrator,
    instance_id: String,
    json: bool,
) -> Result<()> {
    let instance = orchestrator
        .get_instance(&instance_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Workflow instance '{}' not found", instance_id))?;

    // The definition may have been deleted since the instance started
    let definition = orchestrator.get_definition(&instance.definition_id).await?;

    let available = definition
        .as_ref()
        .map(|d| TransitionEngine::available_actions(d, &instance))
        .unwrap_or_default();
    let complete = definition
        .as_ref()
        .is_some_and(|d| instance.is_complete(d));

    if json {
        let output = serde_json::json!({
            "instance": instance,
            "definitionName": definition.as_ref().map(|d| d.name.clone()),
            "isComplete": complete,
            "availableActions": available,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Workflow Instance Status");
    println!("========================");
    println!("Instance ID:    {}", instance.id);
    match &definition {
        Some(d) => println!("Workflow:       {} ({})", d.name, d.id),
        None => println!("Workflow:       {} (deleted)", instance.definition_id),
    }
    println!(
        "Current State:  {}",
        state_label(definition.as_ref(), &instance.current_state_id)
    );
    println!("Complete:       {}", if complete { "yes" } else { "no" });
    println!(
        "Created At:     {}",
        instance.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "Last Updated:   {}",
        instance.last_updated.format("%Y-%m-%d %H:%M:%S")
    );

    println!();
    println!("History:");
    println!("--------");
    print_history(&instance);

    println!();
    println!("Available Actions:");
    println!("------------------");
    if available.is_empty() {
        println!("  (none)");
    } else {
        for action in available {
            println!("  • {} ({}) -> {}", action.id, action.name, action.to_state);
        }
    }

    Ok(())
}

/// Handle instance execute command
pub async fn handle_instance_execute(
    orchestrator: &WorkflowOrchestrator,
    instance_id: String,
    action_id: String,
    json: bool,
) -> Result<()> {
    let instance = orchestrator.execute_action(&instance_id, &action_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&instance)?);
    } else {
        let from = instance
            .history
            .last()
            .map(|h| h.from_state_id.as_str())
            .unwrap_or_default();
        println!(
            "✅ Executed '{}': {} -> {}",
            action_id, from, instance.current_state_id
        );
    }

    Ok(())
}

/// Handle instance delete command
pub async fn handle_instance_delete(
    orchestrator: &WorkflowOrchestrator,
    instance_id: String,
    json: bool,
) -> Result<()> {
    if !orchestrator.delete_instance(&instance_id).await? {
        return Err(anyhow::anyhow!(
            "Workflow instance '{}' not found",
            instance_id
        ));
    }

    if json {
        let output = serde_json::json!({
            "id": instance_id,
            "deleted": true
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("🗑️  Deleted workflow instance {}", instance_id);
    }

    Ok(())
}
