//! Request dispatch
//!
//! Turns an incoming request record into one of four typed actions, runs it
//! against an [`EngineerStore`], and maps the outcome or failure onto a
//! response record. Failures never escape as errors: every path ends in a
//! `Response`.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::DbError;
use crate::model::{Engineer, EngineerRecord};
use crate::store::EngineerStore;

pub const CREATE_ENGINEER: &str = "createEngineer";
pub const UPDATE_ENGINEER: &str = "updateEngineer";
pub const GET_ENGINEER_BY_ID: &str = "getEngineerById";
pub const GET_ENGINEER_ALL: &str = "getEngineerAll";

/// Incoming request record.
///
/// Only `action` is decoded up front. The remaining fields are kept raw and
/// only the one the action needs is decoded: `engineer` for create and
/// update, `userId` for get-by-id. Fields an action does not use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Request {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            payload: Map::new(),
        }
    }

    pub fn with_engineer(mut self, engineer: &Engineer) -> Self {
        self.payload.insert("engineer".to_string(), json!(engineer));
        self
    }

    pub fn with_user_id(mut self, user_id: i32) -> Self {
        self.payload.insert("userId".to_string(), json!(user_id));
        self
    }
}

/// Take `key` out of the payload and decode it. Absent and `null` both count
/// as missing.
fn take_field<T: DeserializeOwned>(
    payload: &mut Map<String, Value>,
    action: &'static str,
    key: &'static str,
) -> Result<T, DispatchError> {
    match payload.remove(key) {
        None | Some(Value::Null) => Err(DispatchError::InvalidPayload {
            action: action.to_string(),
            reason: format!("missing '{key}'"),
        }),
        Some(value) => serde_json::from_value(value).map_err(|e| DispatchError::InvalidPayload {
            action: action.to_string(),
            reason: format!("invalid '{key}': {e}"),
        }),
    }
}

/// A validated action, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create(Engineer),
    Update(Engineer),
    GetById(i32),
    GetAll,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => CREATE_ENGINEER,
            Self::Update(_) => UPDATE_ENGINEER,
            Self::GetById(_) => GET_ENGINEER_BY_ID,
            Self::GetAll => GET_ENGINEER_ALL,
        }
    }
}

impl TryFrom<Request> for Action {
    type Error = DispatchError;

    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let Request {
            action,
            mut payload,
        } = request;

        match action.as_str() {
            CREATE_ENGINEER => take_field(&mut payload, CREATE_ENGINEER, "engineer").map(Self::Create),
            UPDATE_ENGINEER => take_field(&mut payload, UPDATE_ENGINEER, "engineer").map(Self::Update),
            GET_ENGINEER_BY_ID => {
                take_field(&mut payload, GET_ENGINEER_BY_ID, "userId").map(Self::GetById)
            }
            GET_ENGINEER_ALL => Ok(Self::GetAll),
            _ => Err(DispatchError::UnknownAction(action)),
        }
    }
}

/// Why a request produced a failure response
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid payload for '{action}': {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Successful result of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { user_id: i32 },
    Updated { user_id: i32, rows: u64 },
    Found(EngineerRecord),
    All(Vec<EngineerRecord>),
    /// Update touched no rows, or get-by-id found nothing
    NotFound { user_id: i32 },
}

/// Response record returned to the invoking platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: Value,
}

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL_ERROR: u16 = 500;
pub const STATUS_UNAVAILABLE: u16 = 503;

impl Response {
    fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    fn error(status_code: u16, kind: &str, message: impl fmt::Display, retryable: bool) -> Self {
        Self::new(
            status_code,
            json!({
                "error": kind,
                "message": message.to_string(),
                "retryable": retryable
            }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// The `error` kind of a failure body, if any.
    pub fn error_kind(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Created { user_id } => Self::new(
                STATUS_CREATED,
                json!({ "message": "Engineer created", "userId": user_id }),
            ),
            Outcome::Updated { user_id, rows } => Self::new(
                STATUS_OK,
                json!({ "message": "Engineer updated", "userId": user_id, "updated": rows }),
            ),
            Outcome::Found(record) => Self::new(STATUS_OK, json!(record)),
            Outcome::All(records) => Self::new(
                STATUS_OK,
                json!({ "count": records.len(), "engineers": records }),
            ),
            Outcome::NotFound { user_id } => Self::error(
                STATUS_NOT_FOUND,
                "not_found",
                format!("engineer '{user_id}' not found"),
                false,
            ),
        }
    }
}

impl From<&DispatchError> for Response {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::UnknownAction(_) => {
                Self::error(STATUS_BAD_REQUEST, "unknown_action", err, false)
            }
            DispatchError::InvalidPayload { .. } => {
                Self::error(STATUS_BAD_REQUEST, "invalid_payload", err, false)
            }
            // Database details stay in the logs
            DispatchError::Db(db) => {
                let (status, message) = match db {
                    DbError::PoolExhausted => {
                        (STATUS_UNAVAILABLE, "no database connection available, retry later")
                    }
                    DbError::Connectivity(_) => (STATUS_UNAVAILABLE, "database unavailable"),
                    DbError::ConstraintViolation { .. } => {
                        (STATUS_CONFLICT, "request conflicts with existing data")
                    }
                    DbError::UnexpectedRowCount { .. } | DbError::Query(_) => {
                        (STATUS_INTERNAL_ERROR, "an internal error occurred")
                    }
                };
                Self::error(status, db.kind(), message, db.is_retryable())
            }
        }
    }
}

/// Routes requests to the store. Cheap to clone; clones share the store.
pub struct Dispatcher<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: EngineerStore + ?Sized> Dispatcher<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decode a raw request value and dispatch it.
    pub async fn dispatch_value(&self, raw: Value) -> Response {
        match serde_json::from_value::<Request>(raw) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                let err = DispatchError::InvalidPayload {
                    action: "<unknown>".to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(error = %err, "request could not be decoded");
                Response::from(&err)
            }
        }
    }

    /// Dispatch a request and map the result onto a response.
    pub async fn dispatch(&self, request: Request) -> Response {
        let action_name = request.action.clone();
        match self.execute(request).await {
            Ok(outcome) => {
                if let Outcome::NotFound { user_id } = &outcome {
                    tracing::info!(action = %action_name, user_id, "engineer not found");
                }
                Response::from(outcome)
            }
            Err(err) => {
                match &err {
                    DispatchError::Db(db) => tracing::error!(
                        action = %action_name,
                        kind = db.kind(),
                        error = %db,
                        details = ?db,
                        "action failed"
                    ),
                    _ => tracing::warn!(action = %action_name, error = %err, "request rejected"),
                }
                Response::from(&err)
            }
        }
    }

    async fn execute(&self, request: Request) -> Result<Outcome, DispatchError> {
        let action = Action::try_from(request)?;
        self.run(action).await
    }

    /// Run an already-validated action.
    pub async fn run(&self, action: Action) -> Result<Outcome, DispatchError> {
        let outcome = match action {
            Action::Create(engineer) => {
                self.store.create(&engineer).await?;
                Outcome::Created {
                    user_id: engineer.user_id,
                }
            }
            Action::Update(engineer) => match self.store.update(&engineer).await? {
                0 => Outcome::NotFound {
                    user_id: engineer.user_id,
                },
                rows => Outcome::Updated {
                    user_id: engineer.user_id,
                    rows,
                },
            },
            Action::GetById(user_id) => match self.store.get_by_id(user_id).await? {
                Some(record) => Outcome::Found(record),
                None => Outcome::NotFound { user_id },
            },
            Action::GetAll => Outcome::All(self.store.get_all().await?),
        };
        Ok(outcome)
    }
}
