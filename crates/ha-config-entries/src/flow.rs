//! Config flow step results

use serde::Serialize;
use std::collections::HashMap;

/// Error key for form-wide errors
pub const ERROR_BASE: &str = "base";

/// Outcome of one config flow step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Show (or re-show) a form for `step_id`
    Form {
        step_id: String,
        /// Field name (or [`ERROR_BASE`]) -> translation key
        errors: HashMap<String, String>,
        description_placeholders: HashMap<String, String>,
    },

    /// Finish the flow by creating a config entry
    CreateEntry {
        title: String,
        data: HashMap<String, serde_json::Value>,
    },

    /// Finish the flow without creating anything
    Abort { reason: String },
}

impl FlowResult {
    pub fn form(step_id: impl Into<String>) -> Self {
        FlowResult::Form {
            step_id: step_id.into(),
            errors: HashMap::new(),
            description_placeholders: HashMap::new(),
        }
    }

    /// A form carrying a single error
    pub fn form_with_error(
        step_id: impl Into<String>,
        field: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        FlowResult::Form {
            step_id: step_id.into(),
            errors: HashMap::from([(field.into(), error.into())]),
            description_placeholders: HashMap::new(),
        }
    }

    pub fn create_entry(
        title: impl Into<String>,
        data: HashMap<String, serde_json::Value>,
    ) -> Self {
        FlowResult::CreateEntry {
            title: title.into(),
            data,
        }
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        FlowResult::Abort {
            reason: reason.into(),
        }
    }

    /// Add a description placeholder to a form; other results pass through
    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let FlowResult::Form {
            ref mut description_placeholders,
            ..
        } = self
        {
            description_placeholders.insert(key.into(), value.into());
        }
        self
    }

    /// Errors of a form result, empty for anything else
    pub fn errors(&self) -> HashMap<String, String> {
        match self {
            FlowResult::Form { errors, .. } => errors.clone(),
            _ => HashMap::new(),
        }
    }
}
