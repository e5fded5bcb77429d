use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Row};

use crate::auth::{hash_password, verify_password};
use crate::config;
use crate::database::bind_value_as;
use crate::error::ApiError;
use crate::sql::set_clause;

/// Public user record. The stored password hash never leaves the model layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// User with the ids of the jobs they applied to
#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub applications: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Partial update payload. Username and admin flag cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    pub const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("isAdmin", "is_admin"),
    ];

    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(v) = &self.first_name {
            fields.push(("firstName", Value::from(v.clone())));
        }
        if let Some(v) = &self.last_name {
            fields.push(("lastName", Value::from(v.clone())));
        }
        if let Some(v) = &self.password {
            fields.push(("password", Value::from(v.clone())));
        }
        if let Some(v) = &self.email {
            fields.push(("email", Value::from(v.clone())));
        }
        fields
    }
}

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

impl User {
    /// Create a user from already-validated data, hashing the password.
    pub async fn register(pool: &PgPool, data: NewUser) -> Result<User, ApiError> {
        let duplicate = sqlx::query_scalar::<_, String>(
            r#"SELECT username FROM users WHERE username = $1"#,
        )
        .bind(&data.username)
        .fetch_optional(pool)
        .await?;

        if duplicate.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate username: {}",
                data.username
            )));
        }

        let hashed = hash_password(&data.password, config::config().security.bcrypt_cost)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password, first_name, last_name, email, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&data.username)
        .bind(&hashed)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(data.is_admin)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Check credentials; the failure message never says which part was wrong.
    pub async fn authenticate(
        pool: &PgPool,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let row = sqlx::query(&format!(
            r#"SELECT password, {USER_COLUMNS} FROM users WHERE username = $1"#
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = row {
            let hashed: String = row.get("password");
            if verify_password(password, &hashed)? {
                return Ok(User {
                    username: row.get("username"),
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    email: row.get("email"),
                    is_admin: row.get("is_admin"),
                });
            }
        }

        Err(ApiError::unauthorized("Invalid username/password"))
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users ORDER BY username"#
        ))
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    pub async fn get(pool: &PgPool, username: &str) -> Result<UserDetail, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE username = $1"#
        ))
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))?;

        let applications = sqlx::query_scalar::<_, i32>(
            r#"SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id"#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(UserDetail { user, applications })
    }

    pub async fn update(
        pool: &PgPool,
        username: &str,
        mut data: UserUpdate,
    ) -> Result<User, ApiError> {
        if let Some(plain) = data.password.take() {
            data.password = Some(hash_password(
                &plain,
                config::config().security.bcrypt_cost,
            )?);
        }

        let frag = set_clause(&data.assignments(), UserUpdate::COLUMNS)?;

        let sql = format!(
            r#"
            UPDATE users
            SET {}
            WHERE username = ${}
            RETURNING {USER_COLUMNS}
            "#,
            frag.clause,
            frag.params.len() + 1
        );

        let mut query = sqlx::query_as::<_, User>(&sql);
        for param in frag.params.iter() {
            query = bind_value_as(query, param);
        }
        query = query.bind(username);

        query
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))
    }

    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), ApiError> {
        let deleted = sqlx::query_scalar::<_, String>(
            r#"DELETE FROM users WHERE username = $1 RETURNING username"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        if deleted.is_none() {
            return Err(ApiError::not_found(format!("No user: {}", username)));
        }
        Ok(())
    }

    /// Record a job application for the user. Applying twice is a no-op.
    pub async fn apply_to_job(pool: &PgPool, username: &str, job_id: i32) -> Result<(), ApiError> {
        let user = sqlx::query_scalar::<_, String>(
            r#"SELECT username FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        if user.is_none() {
            return Err(ApiError::not_found(format!("No user: {}", username)));
        }

        let job = sqlx::query_scalar::<_, i32>(r#"SELECT id FROM jobs WHERE id = $1"#)
            .bind(job_id)
            .fetch_optional(pool)
            .await?;

        if job.is_none() {
            return Err(ApiError::not_found(format!("No job: {}", job_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO applications (username, job_id)
            VALUES ($1, $2)
            ON CONFLICT (username, job_id) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(job_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_assignments_translate_and_number_in_order() {
        let update = UserUpdate {
            first_name: Some("Test".to_string()),
            last_name: Some("Tester".to_string()),
            password: Some("password".to_string()),
            email: Some("test@test.com".to_string()),
        };
        let frag = set_clause(&update.assignments(), UserUpdate::COLUMNS).unwrap();
        assert_eq!(
            frag.clause,
            "\"first_name\"=$1, \"last_name\"=$2, \"password\"=$3, \"email\"=$4"
        );
        assert_eq!(
            frag.params,
            vec![
                json!("Test"),
                json!("Tester"),
                json!("password"),
                json!("test@test.com")
            ]
        );
    }

    #[test]
    fn update_single_field_falls_back_verbatim() {
        let update = UserUpdate {
            email: Some("new@test.com".to_string()),
            ..Default::default()
        };
        let frag = set_clause(&update.assignments(), UserUpdate::COLUMNS).unwrap();
        assert_eq!(frag.clause, "\"email\"=$1");
    }
}
