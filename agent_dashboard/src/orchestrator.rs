//! # Refresh Orchestrator
//!
//! Drives one refresh cycle:
//!
//! 1. show the loading view (synchronously, before any request is issued);
//! 2. fetch all three sources concurrently and wait for every one to settle;
//! 3. normalize the raw results into a `Snapshot`;
//! 4. hand the snapshot to the render engine.
//!
//! A failing source only degrades its own part of the snapshot. The full-error
//! path is reserved for failures of the cycle itself, such as a fetch task
//! panicking. Nothing escapes `run_cycle` as an error.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinError;

use crate::endpoints::{DataSource, Endpoint, RawFetchResult};
use crate::render::RenderEngine;
use crate::snapshot::{CountReading, Snapshot, StateRow, StateRows};

/// What a cycle ended up doing to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The snapshot was rendered.
    Rendered(Snapshot),
    /// The cycle failed as a whole and the full-error view was shown.
    Failed(String),
    /// A newer cycle started meanwhile; this cycle's result was discarded.
    Superseded,
}

pub struct RefreshOrchestrator {
    source: Arc<dyn DataSource>,
    renderer: RenderEngine,
}

impl RefreshOrchestrator {
    pub fn new(source: Arc<dyn DataSource>, renderer: RenderEngine) -> Self {
        Self { source, renderer }
    }

    pub fn renderer(&self) -> &RenderEngine {
        &self.renderer
    }

    /// Runs one complete cycle. Never panics and never returns an error; the
    /// outcome only reports what was applied to the view.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let ticket = self.renderer.show_loading();
        log::debug!("refresh cycle {} started", ticket.generation());

        match self.fetch_all().await {
            Ok((guardians, platinum, dh)) => {
                log_source_failures(&guardians, &platinum, &dh);
                let snapshot = build_snapshot(&guardians, &platinum, &dh);
                if self.renderer.render(ticket, &snapshot) {
                    CycleOutcome::Rendered(snapshot)
                } else {
                    CycleOutcome::Superseded
                }
            }
            Err(message) => {
                log::error!("Refresh error: {}", message);
                if self.renderer.show_full_error(ticket, &message) {
                    CycleOutcome::Failed(message)
                } else {
                    CycleOutcome::Superseded
                }
            }
        }
    }

    /// Issues all three fetches before awaiting any of them and waits for all
    /// of them to settle, even when one fails early.
    async fn fetch_all(&self) -> Result<(RawFetchResult, RawFetchResult, RawFetchResult), String> {
        let spawn = |endpoint: Endpoint| {
            let source = Arc::clone(&self.source);
            tokio::spawn(async move { source.fetch_json(endpoint).await })
        };

        let (guardians, platinum, dh) = tokio::join!(
            spawn(Endpoint::Guardians),
            spawn(Endpoint::Platinum),
            spawn(Endpoint::DhInsurance),
        );

        Ok((
            guardians.map_err(join_failure)?,
            platinum.map_err(join_failure)?,
            dh.map_err(join_failure)?,
        ))
    }
}

/// Logs one error line per failed source and returns the sources it logged.
fn log_source_failures(
    guardians: &RawFetchResult,
    platinum: &RawFetchResult,
    dh: &RawFetchResult,
) -> Vec<Endpoint> {
    let mut failed = Vec::new();
    for (endpoint, result) in [
        (Endpoint::Guardians, guardians),
        (Endpoint::Platinum, platinum),
        (Endpoint::DhInsurance, dh),
    ] {
        if let Err(e) = result {
            log::error!("{} data error: {}", endpoint.label(), e);
            failed.push(endpoint);
        }
    }
    failed
}

fn join_failure(e: JoinError) -> String {
    if e.is_panic() {
        panic_message(e.into_panic())
    } else {
        e.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error occurred".to_string()
    }
}

/// Normalizes the three raw results into a snapshot.
pub fn build_snapshot(
    guardians: &RawFetchResult,
    platinum: &RawFetchResult,
    dh: &RawFetchResult,
) -> Snapshot {
    Snapshot {
        guardians_count: read_count(guardians, "ready"),
        platinum_count: read_count(platinum, "available_agents"),
        state_rows: read_state_rows(dh),
    }
}

fn read_count(result: &RawFetchResult, field: &str) -> CountReading {
    match result {
        Ok(body) => body
            .get(field)
            .and_then(Value::as_f64)
            .map(CountReading::Value)
            .unwrap_or(CountReading::ErrorMarker),
        Err(_) => CountReading::ErrorMarker,
    }
}

fn read_state_rows(result: &RawFetchResult) -> StateRows {
    match result {
        Ok(Value::Array(items)) => StateRows::Rows(items.iter().map(state_row).collect()),
        Ok(other) => {
            log::warn!("DH Insurance payload is not an array: {}", json_kind(other));
            StateRows::SourceFailed
        }
        Err(_) => StateRows::SourceFailed,
    }
}

/// Builds one row from a DH insurance element.
pub fn state_row(item: &Value) -> StateRow {
    let state_code = match item.get("state") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    match error_detail(item.get("error")) {
        Some(detail) => StateRow {
            state_code,
            ready_count: None,
            error_detail: Some(detail),
        },
        None => StateRow {
            state_code,
            ready_count: Some(coerce_number(item.get("ready"))),
            error_detail: None,
        },
    }
}

/// Truthy `error` values become the error detail; `null`, `false`, `0` and
/// `""` mean no error.
fn error_detail(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

/// Numeric coercion for `ready`: numbers as-is, numeric strings parsed,
/// booleans as 0/1, anything else (including missing) 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
