//! Database layer - connection pool, statements and repository
//!
//! # Design Principles
//!
//! - One pool per process (max 5 connections), passed in explicitly
//! - One statement per operation, no transactions spanning requests
//! - Positional placeholders only, values bound by type
//! - Rely on DB constraints, classify their failures

pub mod pool;
pub mod repo;
pub mod statements;

pub use pool::{DbPool, PoolInitError};
pub use repo::EngineerRepo;
