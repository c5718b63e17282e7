//! Users page
//!
//! Paginated user listing with keyword search, an editor for account fields,
//! deletion, and a per-user planet viewer. Every mutation re-fetches the
//! current page.

use tokio_util::sync::CancellationToken;

use super::time::{to_local_input, to_rfc3339};
use super::ConsoleError;
use crate::api::{AdminApi, AdminUserUpdateRequest, ApiError, PlanetItem, User, UserStatus};

/// Users per listing page
pub const USERS_PAGE_SIZE: u32 = 20;

/// Planets per viewer page
pub const PLANETS_PAGE_SIZE: u32 = 10;

/// Editable copy of a user's fields
#[derive(Debug, Clone, PartialEq)]
pub struct UserEditor {
    pub user_id: u64,
    pub username: String,
    pub avatar: String,
    pub status: UserStatus,
    pub is_subscriber: bool,
    /// Local `YYYY-MM-DDTHH:MM`, empty for none
    pub subscription_expires_at: String,
}

impl UserEditor {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            status: user.status,
            is_subscriber: user.is_subscriber,
            subscription_expires_at: to_local_input(user.subscription_expires_at.as_deref()),
        }
    }

    /// Update payload with trimmed text fields and a UTC expiry
    pub fn to_request(&self) -> AdminUserUpdateRequest {
        AdminUserUpdateRequest {
            username: Some(self.username.trim().to_string()),
            avatar: Some(self.avatar.trim().to_string()),
            role: None,
            status: Some(self.status),
            is_subscriber: Some(self.is_subscriber),
            subscription_expires_at: Some(to_rfc3339(&self.subscription_expires_at)),
        }
    }
}

/// Planets of one user, paged independently of the user list
#[derive(Debug, Clone)]
pub struct PlanetViewer {
    pub user: User,
    pub items: Vec<PlanetItem>,
    pub page: u32,
    pub total: i64,
    pub total_pages: u32,
    pub error: Option<String>,
}

impl PlanetViewer {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub struct UsersPage {
    api: AdminApi,
    cancel: CancellationToken,
    page: u32,
    keyword: String,
    users: Vec<User>,
    total: i64,
    total_pages: u32,
    subscriber_total: i64,
    error: Option<String>,
    planets: Option<PlanetViewer>,
}

impl UsersPage {
    pub fn new(api: &AdminApi) -> Self {
        let (api, cancel) = api.child_scope();
        Self {
            api,
            cancel,
            page: 1,
            keyword: String::new(),
            users: Vec::new(),
            total: 0,
            total_pages: 1,
            subscriber_total: 0,
            error: None,
            planets: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn subscriber_total(&self) -> i64 {
        self.subscriber_total
    }

    /// Last failure, as shown to the operator
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn planets(&self) -> Option<&PlanetViewer> {
        self.planets.as_ref()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn footer_text(&self) -> String {
        if self.total == 0 {
            return "no users".to_string();
        }
        format!(
            "{} users, page {}/{}",
            self.total, self.page, self.total_pages
        )
    }

    /// Fetch the current page
    pub async fn load(&mut self) -> Result<(), ConsoleError> {
        self.error = None;

        let response = self
            .api
            .list_users(self.page, USERS_PAGE_SIZE, &self.keyword)
            .await
            .map_err(|e| self.fail(e))?;

        self.users = response.page.data;
        self.total = response.page.total;
        self.total_pages = response.page.total_pages.max(1);
        self.subscriber_total = response.subscriber_total;
        Ok(())
    }

    /// Fetch an arbitrary page directly, before any listing is known
    pub async fn open(&mut self, page: u32, keyword: &str) -> Result<(), ConsoleError> {
        self.page = page.max(1);
        self.keyword = keyword.trim().to_string();
        self.load().await
    }

    /// Search from page 1 with a trimmed keyword
    pub async fn search(&mut self, input: &str) -> Result<(), ConsoleError> {
        self.page = 1;
        self.keyword = input.trim().to_string();
        self.load().await
    }

    pub async fn reset_search(&mut self) -> Result<(), ConsoleError> {
        self.search("").await
    }

    /// Jump to `page`, clamped to the known range
    pub async fn go_to(&mut self, page: u32) -> Result<(), ConsoleError> {
        self.page = page.clamp(1, self.total_pages.max(1));
        self.load().await
    }

    pub async fn next_page(&mut self) -> Result<(), ConsoleError> {
        if !self.has_next() {
            return Ok(());
        }
        self.go_to(self.page + 1).await
    }

    pub async fn prev_page(&mut self) -> Result<(), ConsoleError> {
        if !self.has_prev() {
            return Ok(());
        }
        self.go_to(self.page - 1).await
    }

    /// Submit the editor, then reload
    pub async fn save(&mut self, editor: &UserEditor) -> Result<User, ConsoleError> {
        self.error = None;

        let updated = self
            .api
            .update_user(editor.user_id, &editor.to_request())
            .await
            .map_err(|e| self.fail(e))?;

        self.load().await?;
        Ok(updated)
    }

    /// Delete a user, stepping back a page when its last row goes away
    pub async fn delete(&mut self, user_id: u64) -> Result<(), ConsoleError> {
        self.error = None;

        self.api
            .delete_user(user_id)
            .await
            .map_err(|e| self.fail(e))?;

        if self.users.len() == 1 && self.page > 1 {
            self.page -= 1;
        }
        self.load().await
    }

    /// Open the planet viewer on page 1 for `user`
    pub async fn open_planets(&mut self, user: &User) -> Result<(), ConsoleError> {
        self.planets = Some(PlanetViewer {
            user: user.clone(),
            items: Vec::new(),
            page: 1,
            total: 0,
            total_pages: 1,
            error: None,
        });
        self.load_planets(1).await
    }

    pub async fn load_planets(&mut self, page: u32) -> Result<(), ConsoleError> {
        let user_id = match &mut self.planets {
            Some(viewer) => {
                viewer.error = None;
                viewer.user.id
            }
            None => return Ok(()),
        };

        let result = self
            .api
            .list_user_planets(user_id, page.max(1), PLANETS_PAGE_SIZE)
            .await;

        let Some(viewer) = self.planets.as_mut() else {
            return Ok(());
        };

        match result {
            Ok(response) => {
                viewer.page = if response.page > 0 { response.page } else { page.max(1) };
                viewer.total = response.total;
                viewer.total_pages = response.total_pages.max(1);
                viewer.items = response.data;
                Ok(())
            }
            Err(e) => {
                if !e.is_cancelled() {
                    viewer.error = Some(e.to_string());
                }
                Err(e.into())
            }
        }
    }

    pub fn close_planets(&mut self) {
        self.planets = None;
    }

    /// Abort in-flight requests; the page is unusable afterwards
    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn fail(&mut self, e: ApiError) -> ConsoleError {
        if !e.is_cancelled() {
            self.error = Some(e.to_string());
        }
        e.into()
    }
}

impl Drop for UsersPage {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
