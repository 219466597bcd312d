//! Storage seam between the dispatcher and the database

use async_trait::async_trait;

use crate::error::DbResult;
use crate::model::{Engineer, EngineerRecord};

/// The four single-row operations on the engineers table.
///
/// Not-found is reported through the return values (zero rows, `None`),
/// never as an error.
#[async_trait]
pub trait EngineerStore: Send + Sync {
    /// Insert a new engineer with the caller's `user_id`.
    async fn create(&self, engineer: &Engineer) -> DbResult<()>;

    /// Overwrite the writable fields of `engineer.user_id`; returns rows affected.
    async fn update(&self, engineer: &Engineer) -> DbResult<u64>;

    async fn get_by_id(&self, user_id: i32) -> DbResult<Option<EngineerRecord>>;

    /// Every engineer, in whatever order the database returns them.
    async fn get_all(&self) -> DbResult<Vec<EngineerRecord>>;
}
