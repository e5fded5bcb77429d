use serde_json::Value;
use sqlx::postgres::PgArguments;

pub mod manager;
pub mod models;

pub use manager::{DatabaseError, DatabaseManager};

/// Bind one clause-builder parameter onto a typed query. The clause builder
/// hands back `serde_json::Value`s, so the JSON type decides the SQL type.
pub(crate) fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres doesn't have u64; cast down if safe
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other.clone()), // JSONB
    }
}
