//! Session shell
//!
//! Owns the operator's authentication state: exchanges the password for a
//! token, fetches the profile and gates the workspace on the admin role. A
//! profile failure right after login is terminal for the session; the operator
//! has to log out and start again.

use tracing::{info, warn};

use super::ConsoleError;
use crate::api::{AdminApi, AdminProfile, LoginRequest};

/// Where the console currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No token stored; show the login view
    SignedOut,
    /// Profile loaded and role is admin
    Ready(AdminProfile),
    /// Signed in, but the role is not admin
    Forbidden(AdminProfile),
    /// Token present but the profile could not be fetched
    Failed(String),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Operator-facing description of a terminal state
    pub fn describe(&self) -> String {
        match self {
            Self::SignedOut => "not signed in".to_string(),
            Self::Ready(profile) => format!("signed in as {} ({})", profile.username, profile.role),
            Self::Forbidden(profile) => format!(
                "insufficient permissions: current role is {}, admin is required",
                profile.role
            ),
            Self::Failed(message) => format!("authentication failed: {}", message),
        }
    }
}

/// Application shell
pub struct Session {
    api: AdminApi,
    state: SessionState,
}

impl Session {
    pub fn new(api: AdminApi) -> Self {
        Self {
            api,
            state: SessionState::SignedOut,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn api(&self) -> &AdminApi {
        &self.api
    }

    /// A token is stored (the profile may not be loaded yet)
    pub fn has_token(&self) -> bool {
        !self.api.client().tokens().get_token().is_empty()
    }

    /// Resume from a previously stored token
    pub async fn restore(&mut self) -> &SessionState {
        if self.has_token() {
            self.load_profile().await
        } else {
            self.state = SessionState::SignedOut;
            &self.state
        }
    }

    /// Exchange `password` for a token, persist it, then load the profile.
    ///
    /// On error nothing is stored and the state stays `SignedOut`.
    pub async fn login(&mut self, password: &str) -> Result<&SessionState, ConsoleError> {
        let response = self
            .api
            .login(&LoginRequest {
                password: password.to_string(),
            })
            .await?;

        let token = response
            .bearer()
            .ok_or(ConsoleError::MissingAccessToken)?
            .to_string();

        self.api.client().tokens().set_token(&token)?;
        info!("Signed in as {}", response.username);

        Ok(self.load_profile().await)
    }

    /// Fetch the operator profile and apply the role gate
    pub async fn load_profile(&mut self) -> &SessionState {
        self.state = match self.api.me().await {
            Ok(profile) if profile.is_admin() => SessionState::Ready(profile),
            Ok(profile) => {
                warn!("Operator {} has role {}, admin required", profile.username, profile.role);
                SessionState::Forbidden(profile)
            }
            Err(e) => SessionState::Failed(e.to_string()),
        };
        &self.state
    }

    /// Drop the stored token and return to the login view
    pub fn logout(&mut self) -> Result<(), ConsoleError> {
        self.api.client().tokens().clear_token()?;
        self.state = SessionState::SignedOut;
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: &str) -> AdminProfile {
        AdminProfile {
            user_id: 1000001,
            username: "app_box_admin".to_string(),
            email: "app_box_admin@local".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_describe_forbidden_names_role() {
        let text = SessionState::Forbidden(profile("user")).describe();
        assert!(text.contains("user"));
        assert!(text.contains("admin is required"));
    }

    #[test]
    fn test_only_ready_is_ready() {
        assert!(SessionState::Ready(profile("admin")).is_ready());
        assert!(!SessionState::Forbidden(profile("guest")).is_ready());
        assert!(!SessionState::Failed("boom".to_string()).is_ready());
        assert!(!SessionState::SignedOut.is_ready());
    }
}
