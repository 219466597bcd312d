//! SQL statements for the engineers table
//!
//! Every statement text is a compile-time constant using positional
//! placeholders. Values only ever travel as typed [`Param`]s, bound in
//! placeholder order by the repository.

use crate::model::Engineer;

macro_rules! select_engineers {
    () => {
        r#"SELECT e.user_id, e.first_name, e.last_name, e.title, e.status_id, e.site_id,
       s.site_name, st.status
FROM engineers e
LEFT JOIN sites s ON s.site_id = e.site_id
LEFT JOIN statuses st ON st.status_id = e.status_id"#
    };
}

pub const INSERT_ENGINEER: &str = r#"INSERT INTO engineers (user_id, first_name, last_name, title, status_id, site_id)
VALUES ($1, $2, $3, $4, $5, $6)"#;

pub const UPDATE_ENGINEER: &str = r#"UPDATE engineers
SET first_name = $1, last_name = $2, title = $3, status_id = $4, site_id = $5
WHERE user_id = $6"#;

pub const SELECT_ENGINEER_BY_ID: &str = concat!(select_engineers!(), "\nWHERE e.user_id = $1");

pub const SELECT_ENGINEERS: &str = select_engineers!();

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i32),
    Text(String),
}

/// Statement text plus its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

pub fn insert_engineer(engineer: &Engineer) -> BoundStatement {
    BoundStatement {
        sql: INSERT_ENGINEER,
        params: vec![
            Param::Int(engineer.user_id),
            Param::Text(engineer.first_name.clone()),
            Param::Text(engineer.last_name.clone()),
            Param::Text(engineer.title.clone()),
            Param::Int(engineer.status_id),
            Param::Int(engineer.site_id),
        ],
    }
}

/// Full overwrite of the writable columns, keyed by `user_id` (last param).
pub fn update_engineer(engineer: &Engineer) -> BoundStatement {
    BoundStatement {
        sql: UPDATE_ENGINEER,
        params: vec![
            Param::Text(engineer.first_name.clone()),
            Param::Text(engineer.last_name.clone()),
            Param::Text(engineer.title.clone()),
            Param::Int(engineer.status_id),
            Param::Int(engineer.site_id),
            Param::Int(engineer.user_id),
        ],
    }
}

pub fn select_engineer_by_id(user_id: i32) -> BoundStatement {
    BoundStatement {
        sql: SELECT_ENGINEER_BY_ID,
        params: vec![Param::Int(user_id)],
    }
}

pub fn select_engineers() -> BoundStatement {
    BoundStatement {
        sql: SELECT_ENGINEERS,
        params: Vec::new(),
    }
}
