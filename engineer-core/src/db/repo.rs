//! Engineer repository
//!
//! Each operation checks out one pooled connection, binds its parameters by
//! type and runs a single statement. The connection guard is dropped on
//! every path out of the method, returning it to the pool.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::Postgres;

use super::pool::DbPool;
use super::statements::{self, BoundStatement, Param};
use crate::error::{DbError, DbResult};
use crate::model::{Engineer, EngineerRecord};
use crate::store::EngineerStore;

/// Engineer repository
#[derive(Clone, Debug)]
pub struct EngineerRepo {
    pool: DbPool,
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [Param],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Param::Int(value) => query.bind(*value),
            Param::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

fn bind_params_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [Param],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            Param::Int(value) => query.bind(*value),
            Param::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

impl EngineerRepo {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn execute(&self, statement: &BoundStatement) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result = bind_params(sqlx::query(statement.sql), &statement.params)
            .persistent(self.pool.caches(statement.sql))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_optional(&self, statement: &BoundStatement) -> DbResult<Option<EngineerRecord>> {
        let mut conn = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, EngineerRecord>(statement.sql);
        let record = bind_params_as(query, &statement.params)
            .persistent(self.pool.caches(statement.sql))
            .fetch_optional(&mut *conn)
            .await?;
        Ok(record)
    }

    async fn fetch_all(&self, statement: &BoundStatement) -> DbResult<Vec<EngineerRecord>> {
        let mut conn = self.pool.acquire().await?;
        let query = sqlx::query_as::<_, EngineerRecord>(statement.sql);
        let records = bind_params_as(query, &statement.params)
            .persistent(self.pool.caches(statement.sql))
            .fetch_all(&mut *conn)
            .await?;
        Ok(records)
    }
}

#[async_trait]
impl EngineerStore for EngineerRepo {
    async fn create(&self, engineer: &Engineer) -> DbResult<()> {
        let affected = self.execute(&statements::insert_engineer(engineer)).await?;
        if affected != 1 {
            return Err(DbError::UnexpectedRowCount {
                expected: 1,
                actual: affected,
            });
        }
        tracing::debug!(user_id = engineer.user_id, "engineer inserted");
        Ok(())
    }

    async fn update(&self, engineer: &Engineer) -> DbResult<u64> {
        let affected = self.execute(&statements::update_engineer(engineer)).await?;
        tracing::debug!(user_id = engineer.user_id, affected, "engineer updated");
        Ok(affected)
    }

    async fn get_by_id(&self, user_id: i32) -> DbResult<Option<EngineerRecord>> {
        self.fetch_optional(&statements::select_engineer_by_id(user_id))
            .await
    }

    async fn get_all(&self) -> DbResult<Vec<EngineerRecord>> {
        let records = self.fetch_all(&statements::select_engineers()).await?;
        tracing::debug!(count = records.len(), "engineers listed");
        Ok(records)
    }
}
