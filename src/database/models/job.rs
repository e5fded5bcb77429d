use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::database::{bind_value_as, models::company::Company};
use crate::error::ApiError;
use crate::sql::{set_clause, where_clause, FilterCond};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<BigDecimal>,
    pub company_handle: String,
}

/// Job with its company expanded, as returned by the detail endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<BigDecimal>,
    pub company: Company,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// Partial update payload. The id and company handle are fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
}

impl JobUpdate {
    // Logical names already match the physical columns here
    pub const COLUMNS: &'static [(&'static str, &'static str)] = &[];

    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(v) = &self.title {
            fields.push(("title", Value::from(v.clone())));
        }
        if let Some(v) = self.salary {
            fields.push(("salary", Value::from(v)));
        }
        if let Some(v) = self.equity {
            fields.push(("equity", Value::from(v)));
        }
        fields
    }
}

/// Recognized list filters. Unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSearch {
    pub title: Option<String>,
    #[serde(rename = "minSalary")]
    pub min_salary: Option<i64>,
    #[serde(rename = "hasEquity")]
    pub has_equity: Option<bool>,
}

impl JobSearch {
    /// First pass of clause construction: keep only the filters that were
    /// supplied. `hasEquity` is a flag predicate - present-and-true emits a
    /// parameterless condition, false or absent emits nothing at all.
    pub fn conditions(self) -> Vec<FilterCond> {
        let mut conds = Vec::new();
        if let Some(title) = self.title {
            conds.push(FilterCond::Contains {
                column: "title",
                value: Value::from(title),
            });
        }
        if let Some(min) = self.min_salary {
            conds.push(FilterCond::AtLeast {
                column: "salary",
                value: Value::from(min),
            });
        }
        if self.has_equity == Some(true) {
            conds.push(FilterCond::Positive { column: "equity" });
        }
        conds
    }
}

impl Job {
    pub async fn create(pool: &PgPool, data: NewJob) -> Result<Job, ApiError> {
        let handle = sqlx::query_scalar::<_, String>(
            r#"SELECT handle FROM companies WHERE handle = $1"#,
        )
        .bind(&data.company_handle)
        .fetch_optional(pool)
        .await?;

        if handle.is_none() {
            return Err(ApiError::bad_request(format!(
                "No such handle: {}",
                data.company_handle
            )));
        }

        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (title, salary, equity, company_handle)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, salary, equity, company_handle
            "#,
        )
        .bind(&data.title)
        .bind(data.salary)
        .bind(data.equity)
        .bind(&data.company_handle)
        .fetch_one(pool)
        .await?;

        Ok(job)
    }

    /// List jobs, narrowed by whatever filters were supplied.
    pub async fn find_all(pool: &PgPool, search: JobSearch) -> Result<Vec<Job>, ApiError> {
        let frag = where_clause(search.conditions());

        let sql = format!(
            r#"
            SELECT id, title, salary, equity, company_handle
            FROM jobs
            {}
            ORDER BY title
            "#,
            frag.clause
        );

        let mut query = sqlx::query_as::<_, Job>(&sql);
        for param in frag.params.iter() {
            query = bind_value_as(query, param);
        }

        let jobs = query.fetch_all(pool).await?;
        Ok(jobs)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<JobDetail, ApiError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, title, salary, equity, company_handle
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))?;

        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT handle, name, description, num_employees, logo_url
            FROM companies
            WHERE handle = $1
            "#,
        )
        .bind(&job.company_handle)
        .fetch_one(pool)
        .await?;

        Ok(JobDetail {
            id: job.id,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company,
        })
    }

    pub async fn update(pool: &PgPool, id: i32, data: JobUpdate) -> Result<Job, ApiError> {
        let frag = set_clause(&data.assignments(), JobUpdate::COLUMNS)?;

        let sql = format!(
            r#"
            UPDATE jobs
            SET {}
            WHERE id = ${}
            RETURNING id, title, salary, equity, company_handle
            "#,
            frag.clause,
            frag.params.len() + 1
        );

        let mut query = sqlx::query_as::<_, Job>(&sql);
        for param in frag.params.iter() {
            query = bind_value_as(query, param);
        }
        query = query.bind(id);

        query
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), ApiError> {
        let deleted =
            sqlx::query_scalar::<_, i32>(r#"DELETE FROM jobs WHERE id = $1 RETURNING id"#)
                .bind(id)
                .fetch_optional(pool)
                .await?;

        if deleted.is_none() {
            return Err(ApiError::not_found(format!("No job: {}", id)));
        }
        Ok(())
    }
}
