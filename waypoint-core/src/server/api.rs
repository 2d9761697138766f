//! HTTP API for workflow definitions and instances

use crate::models::workflow::CreateWorkflowRequest;
use crate::services::logging::{log_error, log_rejection};
use crate::workflow::{WorkflowError, WorkflowOrchestrator};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Error body returned for every failed request
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create HTTP API routes
pub fn create_api_routes(
    orchestrator: Arc<WorkflowOrchestrator>,
    max_request_bytes: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let orchestrator_filter = warp::any().map(move || Arc::clone(&orchestrator));

    // POST /api/workflows - Create a workflow definition
    let create_workflow = warp::path!("api" / "workflows")
        .and(warp::post())
        .and(warp::body::content_length_limit(max_request_bytes))
        .and(warp::body::json())
        .and(orchestrator_filter.clone())
        .and_then(handle_create_workflow);

    // GET /api/workflows - List workflow definitions
    let list_workflows = warp::path!("api" / "workflows")
        .and(warp::get())
        .and(orchestrator_filter.clone())
        .and_then(handle_list_workflows);

    // GET /api/workflows/:id - Get one workflow definition
    let get_workflow = warp::path!("api" / "workflows" / String)
        .and(warp::get())
        .and(orchestrator_filter.clone())
        .and_then(handle_get_workflow);

    // DELETE /api/workflows/:id - Delete a workflow definition
    let delete_workflow = warp::path!("api" / "workflows" / String)
        .and(warp::delete())
        .and(orchestrator_filter.clone())
        .and_then(handle_delete_workflow);

    // POST /api/workflows/:id/instances - Start an instance
    let start_instance = warp::path!("api" / "workflows" / String / "instances")
        .and(warp::post())
        .and(orchestrator_filter.clone())
        .and_then(handle_start_instance);

    // GET /api/instances - List instances
    let list_instances = warp::path!("api" / "instances")
        .and(warp::get())
        .and(orchestrator_filter.clone())
        .and_then(handle_list_instances);

    // GET /api/instances/:id - Get one instance
    let get_instance = warp::path!("api" / "instances" / String)
        .and(warp::get())
        .and(orchestrator_filter.clone())
        .and_then(handle_get_instance);

    // DELETE /api/instances/:id - Delete an instance
    let delete_instance = warp::path!("api" / "instances" / String)
        .and(warp::delete())
        .and(orchestrator_filter.clone())
        .and_then(handle_delete_instance);

    // POST /api/instances/:id/actions/:action_id - Execute an action
    let execute_action = warp::path!("api" / "instances" / String / "actions" / String)
        .and(warp::post())
        .and(orchestrator_filter.clone())
        .and_then(handle_execute_action);

    // GET /api/health - Health check
    let health = warp::path!("api" / "health").and(warp::get()).map(|| {
        warp::reply::json(&HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    });

    health
        .or(create_workflow)
        .or(list_workflows)
        .or(get_workflow)
        .or(delete_workflow)
        .or(start_instance)
        .or(list_instances)
        .or(get_instance)
        .or(delete_instance)
        .or(execute_action)
        .recover(handle_rejection)
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: message.into(),
        }),
        status,
    )
    .into_response()
}

/// Map an orchestrator failure onto a response
///
/// Validation and domain errors are reported verbatim; storage errors are
/// logged and reported generically.
fn error_response(operation: &str, resource: &str, err: WorkflowError) -> Response {
    if err.is_client_error() {
        let message = err.to_string();
        log_rejection(operation, resource, &message);
        json_error(StatusCode::BAD_REQUEST, message)
    } else {
        log_error(&err.to_string(), Some(operation));
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

fn not_found(kind: &str, id: &str) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        format!("{} '{}' not found", kind, id),
    )
}

fn created(body: &impl Serialize, location: String) -> Response {
    let reply = warp::reply::with_status(warp::reply::json(body), StatusCode::CREATED);
    warp::reply::with_header(reply, "location", location).into_response()
}

/// Handle POST /api/workflows
async fn handle_create_workflow(
    request: CreateWorkflowRequest,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    let name = request.name.clone();
    match orchestrator.create_definition(request).await {
        Ok(definition) => Ok(created(
            &definition,
            format!("/api/workflows/{}", definition.id),
        )),
        Err(e) => Ok(error_response("create_definition", &name, e)),
    }
}

/// Handle GET /api/workflows
async fn handle_list_workflows(
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.list_definitions().await {
        Ok(definitions) => Ok(warp::reply::json(&definitions).into_response()),
        Err(e) => Ok(error_response("list_definitions", "*", e)),
    }
}

/// Handle GET /api/workflows/:id
async fn handle_get_workflow(
    id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.get_definition(&id).await {
        Ok(Some(definition)) => Ok(warp::reply::json(&definition).into_response()),
        Ok(None) => Ok(not_found("Workflow definition", &id)),
        Err(e) => Ok(error_response("get_definition", &id, e)),
    }
}

/// Handle DELETE /api/workflows/:id
async fn handle_delete_workflow(
    id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.delete_definition(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(false) => Ok(not_found("Workflow definition", &id)),
        Err(e) => Ok(error_response("delete_definition", &id, e)),
    }
}

/// Handle POST /api/workflows/:id/instances
async fn handle_start_instance(
    definition_id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.start_instance(&definition_id).await {
        Ok(instance) => Ok(created(
            &instance,
            format!("/api/instances/{}", instance.id),
        )),
        Err(e) => Ok(error_response("start_instance", &definition_id, e)),
    }
}

/// Handle GET /api/instances
async fn handle_list_instances(
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.list_instances().await {
        Ok(instances) => Ok(warp::reply::json(&instances).into_response()),
        Err(e) => Ok(error_response("list_instances", "*", e)),
    }
}

/// Handle GET /api/instances/:id
async fn handle_get_instance(
    id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.get_instance(&id).await {
        Ok(Some(instance)) => Ok(warp::reply::json(&instance).into_response()),
        Ok(None) => Ok(not_found("Workflow instance", &id)),
        Err(e) => Ok(error_response("get_instance", &id, e)),
    }
}

/// Handle DELETE /api/instances/:id
async fn handle_delete_instance(
    id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.delete_instance(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(false) => Ok(not_found("Workflow instance", &id)),
        Err(e) => Ok(error_response("delete_instance", &id, e)),
    }
}

/// Handle POST /api/instances/:id/actions/:action_id
async fn handle_execute_action(
    instance_id: String,
    action_id: String,
    orchestrator: Arc<WorkflowOrchestrator>,
) -> Result<Response, Rejection> {
    match orchestrator.execute_action(&instance_id, &action_id).await {
        Ok(instance) => Ok(warp::reply::json(&instance).into_response()),
        Err(e) => Ok(error_response("execute_action", &instance_id, e)),
    }
}

/// Turn unmatched routes and malformed requests into JSON errors
async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(json_error(StatusCode::NOT_FOUND, "Not found"));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", e),
        ));
    }

    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        ));
    }

    if err.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(json_error(
            StatusCode::LENGTH_REQUIRED,
            "Content-Length header is required",
        ));
    }

    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(json_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected a JSON request body",
        ));
    }

    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(json_error(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    log_error(&format!("{:?}", err), Some("unhandled rejection"));
    Ok(json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    ))
}
