//! Operator Console
//!
//! Headless controllers behind the admin console: the session shell that
//! gates access on the operator's role, and one controller per feature page.
//! Each page owns its fetched snapshot and a cancellation token; dropping a
//! page aborts whatever it still has in flight.

pub mod configs;
pub mod session;
pub mod time;
pub mod users;

use thiserror::Error;

use crate::api::ApiError;

pub use configs::{ConfigForm, ConfigsPage};
pub use session::{Session, SessionState};
pub use users::{UserEditor, UsersPage, PLANETS_PAGE_SIZE, USERS_PAGE_SIZE};

/// Console errors
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("backend did not return an access token")]
    MissingAccessToken,

    #[error("config key must not be empty")]
    EmptyConfigKey,

    #[error("token storage failed: {0}")]
    TokenStore(#[from] std::io::Error),
}

impl ConsoleError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_cancelled())
    }
}
