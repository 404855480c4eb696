//! Config flow for Tile
//!
//! The user step validates the account credentials by logging in through
//! the shared [`LoginHandle`] and creates a config entry keyed by the
//! username. The reauth steps replace the password of an existing entry.

use std::collections::HashMap;
use std::sync::Arc;

use ha_config_entries::{
    ConfigEntries, ConfigEntriesError, ConfigEntriesResult, ConfigEntry, ConfigEntrySource,
    ConfigEntryUpdate, FlowResult, ERROR_BASE,
};
use ha_core::{CONF_PASSWORD, CONF_USERNAME};
use ha_tile_client::TileError;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::constants::*;
use crate::login::LoginHandle;

pub type FlowInput = HashMap<String, Value>;

fn input_str<'a>(input: &'a FlowInput, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

pub struct TileConfigFlow {
    config_entries: Arc<ConfigEntries>,
    login: LoginHandle,
    /// Entry being re-authenticated
    reauth_entry: Option<ConfigEntry>,
}

impl TileConfigFlow {
    pub fn new(config_entries: Arc<ConfigEntries>, login: LoginHandle) -> Self {
        Self {
            config_entries,
            login,
            reauth_entry: None,
        }
    }

    /// Log in and map client failures onto form errors
    async fn validate(&self, username: &str, password: &str) -> Result<(), &'static str> {
        match self.login.login(username, password).await {
            Ok(_) => Ok(()),
            Err(TileError::InvalidAuth(reason)) => {
                warn!("Invalid Tile credentials for {}: {}", username, reason);
                Err(ERROR_INVALID_AUTH)
            }
            Err(err) => {
                error!("Unknown Tile error: {}", err);
                Err(ERROR_UNKNOWN)
            }
        }
    }

    /// Handle the initial step
    pub async fn async_step_user(
        &mut self,
        user_input: Option<FlowInput>,
    ) -> ConfigEntriesResult<FlowResult> {
        let Some(input) = user_input else {
            return Ok(FlowResult::form(STEP_USER));
        };
        let (Some(username), Some(password)) = (
            input_str(&input, CONF_USERNAME),
            input_str(&input, CONF_PASSWORD),
        ) else {
            return Ok(FlowResult::form_with_error(STEP_USER, ERROR_BASE, ERROR_UNKNOWN));
        };

        if self
            .config_entries
            .get_by_unique_id(DOMAIN, username)
            .is_some()
        {
            return Ok(FlowResult::abort(ABORT_ALREADY_CONFIGURED));
        }

        if let Err(error) = self.validate(username, password).await {
            return Ok(FlowResult::form_with_error(STEP_USER, ERROR_BASE, error));
        }

        let data = HashMap::from([
            (CONF_USERNAME.to_string(), json!(username)),
            (CONF_PASSWORD.to_string(), json!(password)),
        ]);
        let entry = ConfigEntry::new(DOMAIN, username)
            .with_unique_id(username)
            .with_source(ConfigEntrySource::User)
            .with_data(data.clone());

        let entry = match self.config_entries.add(entry) {
            Ok(entry) => entry,
            Err(ConfigEntriesError::AlreadyExists { .. }) => {
                return Ok(FlowResult::abort(ABORT_ALREADY_CONFIGURED))
            }
            Err(err) => return Err(err),
        };
        info!("Created Tile config entry for {}", username);
        self.config_entries.setup(&entry.entry_id).await?;

        Ok(FlowResult::create_entry(username, data))
    }

    /// Start re-authentication of an existing entry
    pub async fn async_step_reauth(&mut self, entry_id: &str) -> ConfigEntriesResult<FlowResult> {
        let entry = self
            .config_entries
            .get(entry_id)
            .ok_or_else(|| ConfigEntriesError::NotFound(entry_id.to_string()))?;
        self.reauth_entry = Some(entry);
        self.async_step_reauth_confirm(None).await
    }

    /// Ask for a new password and reload the entry with it
    pub async fn async_step_reauth_confirm(
        &mut self,
        user_input: Option<FlowInput>,
    ) -> ConfigEntriesResult<FlowResult> {
        let Some(entry) = self.reauth_entry.clone() else {
            return Ok(FlowResult::abort(ERROR_UNKNOWN));
        };
        let username = entry.data_str(CONF_USERNAME).unwrap_or_default().to_string();
        let form = |result: FlowResult| result.with_placeholder(CONF_USERNAME, username.clone());

        let Some(input) = user_input else {
            return Ok(form(FlowResult::form(STEP_REAUTH_CONFIRM)));
        };
        let Some(password) = input_str(&input, CONF_PASSWORD) else {
            return Ok(form(FlowResult::form_with_error(
                STEP_REAUTH_CONFIRM,
                ERROR_BASE,
                ERROR_UNKNOWN,
            )));
        };

        if let Err(error) = self.validate(&username, password).await {
            return Ok(form(FlowResult::form_with_error(
                STEP_REAUTH_CONFIRM,
                ERROR_BASE,
                error,
            )));
        }

        let mut data = entry.data.clone();
        data.insert(CONF_PASSWORD.to_string(), json!(password));
        self.config_entries
            .update(&entry.entry_id, ConfigEntryUpdate::new().data(data))?;
        self.config_entries.reload(&entry.entry_id).await?;

        info!("Re-authenticated Tile entry {}", entry.entry_id);
        Ok(FlowResult::abort(ABORT_REAUTH_SUCCESSFUL))
    }
}
