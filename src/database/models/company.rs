use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::database::{bind_value_as, models::job::Job};
use crate::error::ApiError;
use crate::sql::{set_clause, where_clause, FilterCond};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Company with its open jobs, as returned by the detail endpoint
#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Partial update payload. Field declaration order fixes the emitted
/// assignment order; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl CompanyUpdate {
    pub const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("numEmployees", "num_employees"),
        ("logoUrl", "logo_url"),
    ];

    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(v) = &self.name {
            fields.push(("name", Value::from(v.clone())));
        }
        if let Some(v) = &self.description {
            fields.push(("description", Value::from(v.clone())));
        }
        if let Some(v) = self.num_employees {
            fields.push(("numEmployees", Value::from(v)));
        }
        if let Some(v) = &self.logo_url {
            fields.push(("logoUrl", Value::from(v.clone())));
        }
        fields
    }
}

/// Recognized list filters. Unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanySearch {
    #[serde(rename = "nameLike")]
    pub name_like: Option<String>,
    #[serde(rename = "minEmployees")]
    pub min_employees: Option<i64>,
    #[serde(rename = "maxEmployees")]
    pub max_employees: Option<i64>,
}

impl CompanySearch {
    /// First pass of clause construction: keep only the filters that were
    /// supplied, after checking that the employee bounds make sense.
    pub fn conditions(self) -> Result<Vec<FilterCond>, ApiError> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(ApiError::bad_request(
                    "minEmployees cannot be greater than maxEmployees",
                ));
            }
        }

        let mut conds = Vec::new();
        if let Some(name) = self.name_like {
            conds.push(FilterCond::Contains {
                column: "name",
                value: Value::from(name),
            });
        }
        if let Some(min) = self.min_employees {
            conds.push(FilterCond::AtLeast {
                column: "num_employees",
                value: Value::from(min),
            });
        }
        if let Some(max) = self.max_employees {
            conds.push(FilterCond::AtMost {
                column: "num_employees",
                value: Value::from(max),
            });
        }
        Ok(conds)
    }
}

impl Company {
    pub async fn create(pool: &PgPool, data: NewCompany) -> Result<Company, ApiError> {
        let duplicate = sqlx::query_scalar::<_, String>(
            r#"SELECT handle FROM companies WHERE handle = $1"#,
        )
        .bind(&data.handle)
        .fetch_optional(pool)
        .await?;

        if duplicate.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate company: {}",
                data.handle
            )));
        }

        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (handle, name, description, num_employees, logo_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING handle, name, description, num_employees, logo_url
            "#,
        )
        .bind(&data.handle)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.num_employees)
        .bind(&data.logo_url)
        .fetch_one(pool)
        .await?;

        Ok(company)
    }

    /// List companies, narrowed by whatever filters were supplied.
    pub async fn find_all(pool: &PgPool, search: CompanySearch) -> Result<Vec<Company>, ApiError> {
        let frag = where_clause(search.conditions()?);

        let sql = format!(
            r#"
            SELECT handle, name, description, num_employees, logo_url
            FROM companies
            {}
            ORDER BY name
            "#,
            frag.clause
        );

        let mut query = sqlx::query_as::<_, Company>(&sql);
        for param in frag.params.iter() {
            query = bind_value_as(query, param);
        }

        let companies = query.fetch_all(pool).await?;
        Ok(companies)
    }

    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyDetail, ApiError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT handle, name, description, num_employees, logo_url
            FROM companies
            WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, title, salary, equity, company_handle
            FROM jobs
            WHERE company_handle = $1
            ORDER BY title
            "#,
        )
        .bind(handle)
        .fetch_all(pool)
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    pub async fn update(
        pool: &PgPool,
        handle: &str,
        data: CompanyUpdate,
    ) -> Result<Company, ApiError> {
        let frag = set_clause(&data.assignments(), CompanyUpdate::COLUMNS)?;

        let sql = format!(
            r#"
            UPDATE companies
            SET {}
            WHERE handle = ${}
            RETURNING handle, name, description, num_employees, logo_url
            "#,
            frag.clause,
            frag.params.len() + 1
        );

        let mut query = sqlx::query_as::<_, Company>(&sql);
        for param in frag.params.iter() {
            query = bind_value_as(query, param);
        }
        query = query.bind(handle);

        query
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))
    }

    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), ApiError> {
        let deleted = sqlx::query_scalar::<_, String>(
            r#"DELETE FROM companies WHERE handle = $1 RETURNING handle"#,
        )
        .bind(handle)
        .fetch_optional(pool)
        .await?;

        if deleted.is_none() {
            return Err(ApiError::not_found(format!("No company: {}", handle)));
        }
        Ok(())
    }
}
