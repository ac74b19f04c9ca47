use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;
use crate::store::{StoreError, UserStore};
use crate::types::{NewUser, User};

/// Postgres error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password: row.get("password"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_active: row.get("is_active"),
        last_login: row.get("last_login"),
        date_joined: row.get("date_joined"),
    }
}

impl UserStore for PgUserStore {
    #[instrument(name = "Inserting inactive user into DB", skip(self, new_user),
    fields(new_user_email = %new_user.email))]
    async fn create_inactive(&self, new_user: &NewUser) -> Result<User, StoreError> {
        sqlx::query(
            "INSERT INTO users (email, password, first_name, last_name, is_active) \
            VALUES ($1, $2, $3, $4, FALSE) \
            RETURNING id, email, password, first_name, last_name, is_active, last_login, date_joined",
        )
            .bind(&new_user.email)
            .bind(&new_user.password)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .map(user_from_row)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::event!(target: "sqlx", tracing::Level::ERROR, "Failed to insert user into DB: {:#?}", e);
                let is_duplicate = e
                    .as_database_error()
                    .and_then(|db_error| db_error.code())
                    .map_or(false, |code| code == UNIQUE_VIOLATION);
                if is_duplicate {
                    StoreError::AlreadyExists
                } else {
                    StoreError::Database(e)
                }
            })
    }

    #[instrument(name = "Getting a user from DB", skip(self, email), fields(user_email = %email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query(
            "SELECT id, email, password, first_name, last_name, is_active, last_login, date_joined \
            FROM users WHERE email = $1",
        )
            .bind(email)
            .map(user_from_row)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::event!(target: "sqlx", tracing::Level::ERROR, "Failed to query user: {:#?}", e);
                StoreError::Database(e)
            })
    }

    #[instrument(name = "Mark a user active", skip(self, user), fields(user_id = %user.id))]
    async fn activate(&self, user: &User) -> Result<bool, StoreError> {
        sqlx::query("UPDATE users SET is_active = TRUE, last_login = $2 WHERE id = $1 AND is_active = FALSE")
            .bind(user.id)
            .bind(user.last_login)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() == 1)
            .map_err(|e| {
                tracing::event!(target: "sqlx", tracing::Level::ERROR, "Failed to execute query: {:#?}", e);
                StoreError::Database(e)
            })
    }

    #[instrument(name = "Deleting user", skip(self), fields(user_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::event!(target: "sqlx", tracing::Level::ERROR, "Failed to delete user: {:#?}", e);
                StoreError::Database(e)
            })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(StoreError::Database)
    }
}
