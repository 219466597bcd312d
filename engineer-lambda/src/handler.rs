//! Invocation handler
//!
//! One invocation, one request: log the raw input, dispatch it, return the
//! response record. Failures are already folded into the response by the
//! dispatcher, so this never returns an error to the runtime.

use engineer_core::{Dispatcher, EngineerStore, Response};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::Instrument;

pub async fn handle<S>(dispatcher: &Dispatcher<S>, event: LambdaEvent<Value>) -> Result<Response, Error>
where
    S: EngineerStore + ?Sized,
{
    let (payload, context) = event.into_parts();
    let span = tracing::info_span!("invocation", request_id = %context.request_id);

    async move {
        tracing::info!(input = %payload, "invocation received");
        let response = dispatcher.dispatch_value(payload).await;
        tracing::info!(status_code = response.status_code, "invocation complete");
        Ok(response)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use engineer_core::test_support::{ada, MemoryStore};
    use lambda_runtime::Context;
    use serde_json::json;
    use std::sync::Arc;

    fn event(payload: Value) -> LambdaEvent<Value> {
        LambdaEvent::new(payload, Context::default())
    }

    #[tokio::test]
    async fn create_and_fetch_through_handler() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::with_lookups()));

        let created = handle(
            &dispatcher,
            event(json!({ "action": "createEngineer", "engineer": ada() })),
        )
        .await
        .unwrap();
        assert_eq!(created.status_code, 201);

        let found = handle(
            &dispatcher,
            event(json!({ "action": "getEngineerById", "userId": 1 })),
        )
        .await
        .unwrap();
        assert_eq!(found.status_code, 200);
        assert_eq!(found.body["firstName"], "Ada");
        assert_eq!(found.body["siteName"], "London");
        assert_eq!(found.body["status"], "Active");
    }

    #[tokio::test]
    async fn unknown_action_is_a_response_not_an_error() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()));

        let response = handle(&dispatcher, event(json!({ "action": "deleteEngineer", "userId": 1 })))
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(response.error_kind(), Some("unknown_action"));
        assert_eq!(dispatcher.store().calls(), 0);
    }

    #[tokio::test]
    async fn garbage_input_is_a_response_not_an_error() {
        let dispatcher = Dispatcher::new(Arc::new(MemoryStore::new()));

        let response = handle(&dispatcher, event(json!("hello"))).await.unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(response.error_kind(), Some("invalid_payload"));
    }
}
