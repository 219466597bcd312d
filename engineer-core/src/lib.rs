//! engineer-core: pooled data access for the engineers table
//!
//! Provides the connection pool, the four parameterized CRUD operations and
//! the dispatcher that maps action requests onto them.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, DbConfig, StatementCacheConfig};
pub use db::{DbPool, EngineerRepo, PoolInitError};
pub use dispatch::{Action, DispatchError, Dispatcher, Outcome, Request, Response};
pub use error::{DbError, DbResult};
pub use model::{Engineer, EngineerRecord};
pub use store::EngineerStore;
