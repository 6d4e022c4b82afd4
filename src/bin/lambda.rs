//! AWS Lambda entry point for the purger
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! Invoke with storage notifications or enveloped control messages.

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use purger::lambda::handler;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Purger Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
