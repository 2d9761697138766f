//! Workflow definition command handlers

use anyhow::{Context, Result};
use std::path::Path;
use waypoint_core::models::workflow::{CreateWorkflowRequest, WorkflowDefinition};
use waypoint_core::workflow::{WorkflowOrchestrator, WorkflowValidator};

/// Parse a definition file; `.json` files are read as JSON, anything else as YAML
pub fn read_definition_file(workflow_file: &str) -> Result<CreateWorkflowRequest> {
    let content = std::fs::read_to_string(workflow_file)
        .with_context(|| format!("Failed to read workflow file: {}", workflow_file))?;

    let is_json = Path::new(workflow_file)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).context("Failed to parse workflow JSON")
    } else {
        serde_yaml::from_str(&content).context("Failed to parse workflow YAML")
    }
}

fn print_definition(definition: &WorkflowDefinition) {
    println!("Workflow Definition");
    println!("===================");
    println!("ID:           {}", definition.id);
    println!("Name:         {}", definition.name);
    if let Some(desc) = &definition.description {
        println!("Description:  {}", desc);
    }
    println!(
        "Created At:   {}",
        definition.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!();
    println!("States:");
    for state in &definition.states {
        let mut flags = Vec::new();
        if state.is_initial {
            flags.push("initial");
        }
        if state.is_final {
            flags.push("final");
        }
        if flags.is_empty() {
            println!("  • {} ({})", state.id, state.name);
        } else {
            println!("  • {} ({}) [{}]", state.id, state.name, flags.join(", "));
        }
    }

    if !definition.actions.is_empty() {
        println!();
        println!("Actions:");
        for action in &definition.actions {
            println!(
                "  • {} ({}): {} -> {}{}",
                action.id,
                action.name,
                action.from_states.join(", "),
                action.to_state,
                if action.enabled { "" } else { " [disabled]" }
            );
        }
    }
}

/// Handle workflow create command
pub async fn handle_workflow_create(
    orchestrator: &WorkflowOrchestrator,
    workflow_file: String,
    json: bool,
) -> Result<()> {
    let request = read_definition_file(&workflow_file)?;
    let definition = orchestrator.create_definition(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    } else {
        println!("✅ Created workflow '{}'", definition.name);
        println!("   Definition ID: {}", definition.id);
        println!();
        println!(
            "Use 'waypoint instance start {}' to start an instance",
            definition.id
        );
    }

    Ok(())
}

/// Handle workflow list command
pub async fn handle_workflow_list(orchestrator: &WorkflowOrchestrator, json: bool) -> Result<()> {
    let definitions = orchestrator.list_definitions().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
    } else if definitions.is_empty() {
        println!("No workflow definitions.");
        println!();
        println!("Create one with 'waypoint workflow create <file>'.");
    } else {
        println!("Workflow Definitions:");
        println!("=====================");
        for definition in &definitions {
            println!("  • {} ({})", definition.name, definition.id);
            if let Some(desc) = &definition.description {
                println!("    {}", desc);
            }
            println!(
                "    States: {}, Actions: {}",
                definition.states.len(),
                definition.actions.len()
            );
        }
    }

    Ok(())
}

/// Handle workflow show command
pub async fn handle_workflow_show(
    orchestrator: &WorkflowOrchestrator,
    definition_id: String,
    json: bool,
) -> Result<()> {
    let definition = orchestrator
        .get_definition(&definition_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Workflow definition '{}' not found", definition_id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    } else {
        print_definition(&definition);

        // Stored documents can be edited by hand
        if let Err(e) = WorkflowValidator::validate_definition(&definition) {
            println!();
            println!("⚠  Stored definition no longer validates: {}", e);
        }
    }

    Ok(())
}

/// Handle workflow delete command
pub async fn handle_workflow_delete(
    orchestrator: &WorkflowOrchestrator,
    definition_id: String,
    json: bool,
) -> Result<()> {
    if !orchestrator.delete_definition(&definition_id).await? {
        return Err(anyhow::anyhow!(
            "Workflow definition '{}' not found",
            definition_id
        ));
    }

    if json {
        let output = serde_json::json!({
            "id": definition_id,
            "deleted": true
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("🗑️  Deleted workflow definition {}", definition_id);
    }

    Ok(())
}

/// Handle workflow validate command
pub fn handle_workflow_validate(workflow_file: String, json: bool) -> Result<()> {
    let request = read_definition_file(&workflow_file)?;
    let result = WorkflowValidator::validate(&request);

    if json {
        let output = serde_json::json!({
            "file": workflow_file,
            "name": request.name,
            "valid": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Validating workflow: {}", request.name);
        println!("File: {}", workflow_file);
        println!();

        match &result {
            Ok(()) => {
                println!("✓ Workflow is valid");
                println!();
                println!("Summary:");
                println!("  States:   {}", request.states.len());
                println!("  Actions:  {}", request.actions.len());
                if let Some(initial) = request.states.iter().find(|s| s.is_initial) {
                    println!("  Initial:  {}", initial.id);
                }
            }
            Err(e) => {
                println!("✗ {}", e);
            }
        }
    }

    result.map_err(|_| anyhow::anyhow!("Workflow validation failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_yaml_definition() {
        let file = write_temp(
            ".yaml",
            r#"
name: ticket
states:
  - id: open
    name: Open
    isInitial: true
  - id: closed
    name: Closed
    isFinal: true
actions:
  - id: close
    name: Close
    fromStates: [open]
    toState: closed
"#,
        );

        let request = read_definition_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(request.name, "ticket");
        assert_eq!(request.states.len(), 2);
        assert!(request.states[0].is_initial);
        assert!(request.actions[0].enabled);
        assert_eq!(request.actions[0].from_states, vec!["open"]);
    }

    #[test]
    fn test_read_json_definition() {
        let file = write_temp(
            ".json",
            r#"{"name":"ticket","states":[{"id":"open","name":"Open","isInitial":true}]}"#,
        );

        let request = read_definition_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(request.name, "ticket");
        assert!(request.actions.is_empty());
    }

    #[test]
    fn test_validate_reports_failure() {
        let file = write_temp(".yaml", "name: broken\nstates: []\n");
        assert!(handle_workflow_validate(file.path().display().to_string(), true).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = read_definition_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read workflow file"));
    }
}
