//! AWS Lambda handler for running wealth projections
//!
//! Accepts a plan (plus optional Monte Carlo options) as JSON and returns
//! the full projection result. Supports Lambda Function URLs for direct
//! HTTP access.

use chrono::{NaiveDate, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};

use retirement_system::{project, project_monte_carlo, MonteCarloOptions, Plan, Projection};

/// Input for one projection call
#[derive(Debug, Deserialize)]
pub struct ProjectionRequest {
    /// The plan to project
    pub plan: Plan,

    /// Valuation date all event dates resolve against; defaults to today
    #[serde(default)]
    pub valuation_date: Option<NaiveDate>,

    /// When present, a Monte Carlo range is layered over the result
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloOptions>,
}

/// Output from the projection
#[derive(Debug, Serialize)]
pub struct ProjectionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Projection>,

    pub execution_time_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn error_response(status: u16, message: &str, execution_time_ms: u64) -> Response<Body> {
    let body = ProjectionResponse {
        result: None,
        execution_time_ms,
        error: Some(message.to_string()),
    };
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Text(
            serde_json::to_string(&body).unwrap_or_else(|_| String::from("{}")),
        ))
        .unwrap_or_default()
}

fn json_response(body: &ProjectionResponse) -> Response<Body> {
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Text(
            serde_json::to_string(body).unwrap_or_else(|_| String::from("{}")),
        ))
        .unwrap_or_default()
}

/// Lambda handler function
async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let start = std::time::Instant::now();

    // Handle CORS preflight
    if event.method().as_str() == "OPTIONS" {
        return Ok(Response::builder()
            .status(200)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type")
            .body(Body::Empty)
            .unwrap_or_default());
    }

    let request: ProjectionRequest = match serde_json::from_slice(event.body()) {
        Ok(request) => request,
        Err(e) => {
            return Ok(error_response(
                400,
                &format!("invalid request body: {e}"),
                start.elapsed().as_millis() as u64,
            ));
        }
    };

    // The engine itself never reads the clock; the boundary supplies the
    // valuation date once per call
    let valuation_date = request
        .valuation_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let outcome = match &request.monte_carlo {
        Some(options) => project_monte_carlo(&request.plan, valuation_date, options),
        None => project(&request.plan, valuation_date),
    };

    let execution_time_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(result) => Ok(json_response(&ProjectionResponse {
            result: Some(result),
            execution_time_ms,
            error: None,
        })),
        Err(e) => Ok(error_response(422, &e.to_string(), execution_time_ms)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
