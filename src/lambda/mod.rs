// src/lambda/mod.rs

//! AWS Lambda handler for the purger.
//!
//! One function serves every trigger:
//! 1. Storage notifications purge the pages of the changed objects
//! 2. `announcement_complete` purges the day's mailing and `announce`
//! 3. A paper purge request purges every page of that paper
//!
//! Unrecoverable messages are logged with their raw input and answered
//! with an error status rather than a function error, so they are not
//! redelivered.

use std::time::Instant;

use chrono::Utc;
use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::config::{LambdaConfigLoader, config_path, load_config};
use crate::error::Result;
use crate::models::{ANNOUNCEMENT_COMPLETE, Config, ControlMessage, Invocation, TargetKind};
use crate::pipeline::{self, PurgeSummary};
use crate::purge::{Invalidator, fastly_transport};
use crate::services::StorageKeyMapper;
use crate::storage::S3Storage;

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
pub struct PurgeResponse {
    /// `success`, `partial`, `ignored` or `error`
    pub status: String,

    /// One summary per pipeline run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<PurgeSummary>,

    /// Error message if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl PurgeResponse {
    fn from_summaries(summaries: Vec<PurgeSummary>) -> Self {
        let status = if summaries.is_empty() {
            "ignored"
        } else if summaries.iter().all(PurgeSummary::is_success) {
            "success"
        } else {
            "partial"
        };
        Self {
            status: status.to_string(),
            summaries,
            ..Default::default()
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<PurgeResponse, LambdaError> {
    let start = Instant::now();
    let (payload, _context) = event.into_parts();

    let mut response = respond(run(&payload).await, &payload)?;
    response.execution_time_ms = start.elapsed().as_millis() as u64;
    info!("Finished with status {} in {}ms", response.status, response.execution_time_ms);
    Ok(response)
}

/// Acknowledge successes and unrecoverable messages; hand every other
/// failure back to the runtime so the message is redelivered.
fn respond(
    result: Result<Vec<PurgeSummary>>,
    payload: &Value,
) -> std::result::Result<PurgeResponse, LambdaError> {
    match result {
        Ok(summaries) => Ok(PurgeResponse::from_summaries(summaries)),
        Err(e) if e.is_unrecoverable() => {
            error!("Dropping unrecoverable message: {}. Raw input: {}", e, payload);
            Ok(PurgeResponse {
                status: "error".to_string(),
                error: Some(e.to_string()),
                ..Default::default()
            })
        }
        Err(e) => {
            error!("Purge failed, leaving for redelivery: {}. Raw input: {}", e, payload);
            Err(e.into())
        }
    }
}

async fn run(payload: &Value) -> Result<Vec<PurgeSummary>> {
    let invocation = Invocation::from_value(payload)?;
    let config = load_lambda_config().await?;
    let transport = fastly_transport(&config)?;
    let invalidator = Invalidator::from_config(&config, TargetKind::Paper, transport.clone())?;

    match invocation {
        Invocation::Objects(events) => {
            let mapper = StorageKeyMapper::new(&config.objects);
            let mut summaries = Vec::with_capacity(events.len());
            for event in &events {
                info!("Object changed: {}/{}", event.bucket, event.name);
                summaries.push(pipeline::run_object_purge(event, &mapper, &invalidator).await);
            }
            Ok(summaries)
        }
        Invocation::Control(ControlMessage::Event { event, date })
            if event == ANNOUNCEMENT_COMPLETE =>
        {
            let store = S3Storage::from_env().await?;
            let announce = Invalidator::from_config(&config, TargetKind::Announce, transport)?;
            let date = date.unwrap_or_else(|| pipeline::mailing_date(Utc::now()));
            let summary =
                pipeline::run_announcement_purge(&store, date, &invalidator, &announce).await?;
            Ok(vec![summary])
        }
        Invocation::Control(ControlMessage::Event { event, .. }) => {
            warn!("Ignoring unknown event '{}'", event);
            Ok(Vec::new())
        }
        Invocation::Control(ControlMessage::PaperPurge(request)) => {
            let store = S3Storage::from_env().await?;
            let summary = pipeline::run_paper_purge(&store, &request, &invalidator).await?;
            Ok(vec![summary])
        }
    }
}

/// Load configuration from S3 when `CONFIG_S3_PREFIX` is set, else from
/// the bundled file and the environment.
async fn load_lambda_config() -> Result<Config> {
    let config = match LambdaConfigLoader::from_env().await? {
        Some(loader) => loader.load_config().await?,
        None => load_config(&config_path())?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use lambda_runtime::Context;
    use serde_json::json;

    use super::*;
    use crate::error::AppError;
    use crate::purge::{PurgeReport, TargetFailure};

    #[tokio::test]
    async fn test_handler_acknowledges_malformed_message() {
        let event = LambdaEvent::new(json!({"hello": "world"}), Context::default());
        let response = handler(event).await.unwrap();
        assert_eq!(response.status, "error");
        assert!(response.error.unwrap().contains("unrecognized message"));
    }

    #[test]
    fn test_unrecoverable_error_is_acknowledged() {
        let result = Err(AppError::InvalidPaperId("garbage".to_string()));
        let response = respond(result, &json!({"paper_id": "garbage"})).unwrap();
        assert_eq!(response.status, "error");
    }

    #[test]
    fn test_transient_error_is_redelivered() {
        let payload = json!({"message": {"data": ""}});
        assert!(respond(Err(AppError::S3("SlowDown".to_string())), &payload).is_err());
        assert!(respond(Err(AppError::config("S3_BUCKET is not set")), &payload).is_err());
    }

    #[test]
    fn test_response_status() {
        assert_eq!(PurgeResponse::from_summaries(Vec::new()).status, "ignored");

        let ok = PurgeSummary::new("object");
        assert_eq!(PurgeResponse::from_summaries(vec![ok.clone()]).status, "success");

        let mut failed = PurgeSummary::new("object");
        failed.reports.push(PurgeReport {
            failed: vec![TargetFailure {
                domain: "arxiv.org".to_string(),
                message: "503".to_string(),
            }],
            ..PurgeReport::default()
        });
        assert_eq!(PurgeResponse::from_summaries(vec![ok, failed]).status, "partial");
    }

    #[test]
    fn test_response_serialization() {
        let response = PurgeResponse {
            status: "error".to_string(),
            error: Some("bad".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("summaries").is_none());
    }
}
