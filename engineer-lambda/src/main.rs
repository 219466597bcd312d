//! engineer-manager: serverless handler for engineer CRUD actions
//!
//! The pool is built once per process, before the runtime loop starts, and
//! every invocation borrows it through the dispatcher. An unreachable
//! database at startup is fatal.

mod handler;
mod tracing_setup;

use std::sync::Arc;

use anyhow::Context as _;
use engineer_core::{DbConfig, DbPool, Dispatcher, EngineerRepo};
use lambda_runtime::{run, service_fn, Error};

use crate::tracing_setup::TracingConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Local runs may keep credentials in .env; deployed functions use real env
    dotenvy::dotenv().ok();

    tracing_setup::init(&TracingConfig::from_env())?;

    let result = serve().await;
    if let Err(err) = &result {
        tracing::error!(error = %err, "engineer-manager stopped");
    }

    tracing_setup::shutdown_otel();
    result
}

async fn serve() -> Result<(), Error> {
    let config = DbConfig::from_env().context("failed to load database configuration")?;
    tracing::info!(db_target = ?config.target, "database configuration loaded");

    let pool = DbPool::connect(&config)
        .await
        .context("database unavailable at startup")?;
    let dispatcher = Dispatcher::new(Arc::new(EngineerRepo::new(pool.clone())));

    let result = run(service_fn(|event| handler::handle(&dispatcher, event))).await;

    pool.close().await;
    result
}
