//! Configs page
//!
//! Lists every config entry and edits them through a single form. Submitting
//! creates or updates by key; both submit and delete reload the list.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::ConsoleError;
use crate::api::{AdminApi, ApiError, AppConfig, AppConfigUpsertRequest, ConfigValueType};

/// Config edit form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigForm {
    pub key: String,
    pub alias: String,
    pub config_value: String,
    pub value_type: ConfigValueType,
    pub description: String,
}

impl ConfigForm {
    /// Prefill from an existing entry
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            key: config.config_key.clone(),
            alias: config.alias.clone(),
            config_value: config.config_value.clone(),
            value_type: config.value_type,
            description: config.description.clone(),
        }
    }

    pub fn helper_text(&self) -> &'static str {
        self.value_type.helper_text()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Trimmed key plus payload; fails on a blank key
    pub fn to_request(&self) -> Result<(String, AppConfigUpsertRequest), ConsoleError> {
        let key = self.key.trim();
        if key.is_empty() {
            return Err(ConsoleError::EmptyConfigKey);
        }

        Ok((
            key.to_string(),
            AppConfigUpsertRequest {
                alias: self.alias.trim().to_string(),
                config_value: self.config_value.trim().to_string(),
                value_type: self.value_type,
                description: self.description.trim().to_string(),
            },
        ))
    }
}

pub struct ConfigsPage {
    api: AdminApi,
    cancel: CancellationToken,
    configs: Vec<AppConfig>,
    form: ConfigForm,
    error: Option<String>,
}

impl ConfigsPage {
    pub fn new(api: &AdminApi) -> Self {
        let (api, cancel) = api.child_scope();
        Self {
            api,
            cancel,
            configs: Vec::new(),
            form: ConfigForm::default(),
            error: None,
        }
    }

    pub fn configs(&self) -> &[AppConfig] {
        &self.configs
    }

    pub fn form(&self) -> &ConfigForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ConfigForm {
        &mut self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> Result<(), ConsoleError> {
        self.error = None;
        let configs = self.api.list_configs().await.map_err(|e| self.fail(e))?;
        debug!("Loaded {} config entries", configs.len());
        self.configs = configs;
        Ok(())
    }

    /// Load `config` into the form
    pub fn edit(&mut self, config: &AppConfig) {
        self.form = ConfigForm::from_config(config);
    }

    /// Upsert the form, clear it and reload
    pub async fn submit(&mut self) -> Result<AppConfig, ConsoleError> {
        self.error = None;

        let (key, payload) = match self.form.to_request() {
            Ok(parts) => parts,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        let saved = self
            .api
            .upsert_config(&key, &payload)
            .await
            .map_err(|e| self.fail(e))?;

        self.form.reset();
        self.load().await?;
        Ok(saved)
    }

    pub async fn delete(&mut self, key: &str) -> Result<(), ConsoleError> {
        self.error = None;
        self.api
            .delete_config(key)
            .await
            .map_err(|e| self.fail(e))?;
        self.load().await
    }

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

impl Drop for ConfigsPage {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
