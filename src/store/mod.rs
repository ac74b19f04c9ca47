//! Persistence of user accounts.
//!
//! The verification flow only needs a handful of operations on users, captured by
//! [`UserStore`]. [`PgUserStore`] is the PostgreSQL implementation used by
//! the running service.

mod postgres;

use std::future::Future;
use thiserror::Error;
use uuid::Uuid;
use crate::types::{NewUser, User};

pub use postgres::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a user with that email address already exists")]
    AlreadyExists,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub trait UserStore: Send + Sync + 'static {
    /// Persist a new account with `is_active = false`.
    fn create_inactive(
        &self,
        new_user: &NewUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Returns `None` if no account uses `email`.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Marks `user` active with its `last_login`, but only while the stored
    /// account is still inactive. Returns `false` when another request
    /// activated it first.
    fn activate(&self, user: &User) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Cheap round trip used by the health check.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
