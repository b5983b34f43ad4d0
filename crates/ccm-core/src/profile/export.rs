//! Profile export/import operations
//!
//! Exports carry the settings content plus `name`/`description` and never the
//! registry's bookkeeping fields. Imports arrive as untyped JSON and must pass
//! [`ValidatedImport::parse`] before they can touch the registry.

use crate::profile::{NewProfile, Permissions, Profile, ProfileEnv};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Exported profile format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileExport {
    /// Profile name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment settings
    pub env: ProfileEnv,
    /// Permission rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Credential helper command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_helper: Option<String>,
}

impl From<&Profile> for ProfileExport {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            description: profile.description.clone(),
            env: profile.env.clone(),
            permissions: profile.permissions.clone(),
            api_key_helper: profile.api_key_helper.clone(),
        }
    }
}

/// Error type for export/import file operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// File content is neither an object nor an array of objects
    #[error("Import file must contain a profile object or an array of profiles")]
    UnexpectedShape,
}

/// Why an import payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Payload is not a JSON object
    #[error("Profile payload must be a JSON object")]
    NotAnObject,
    /// `name` missing, empty or not a string
    #[error("Profile name is required")]
    MissingName,
    /// `env` missing or not an object
    #[error("Profile env block is required")]
    MissingEnv,
    /// `env.ANTHROPIC_API_KEY` missing or empty
    #[error("Profile credential (env.ANTHROPIC_API_KEY) is required")]
    MissingCredential,
    /// A present field has the wrong type
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },
}

/// Import payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImport(NewProfile);

impl ValidatedImport {
    /// Validate an untyped payload
    ///
    /// Only `name`, `description`, `env`, `permissions` and `apiKeyHelper`
    /// are taken from the payload; anything else is ignored.
    ///
    /// # Errors
    /// Returns the first validation failure found
    pub fn parse(raw: &Value) -> Result<Self, ValidationFailure> {
        let obj = raw.as_object().ok_or(ValidationFailure::NotAnObject)?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or(ValidationFailure::MissingName)?;

        let env_value = obj
            .get("env")
            .filter(|e| e.is_object())
            .ok_or(ValidationFailure::MissingEnv)?;

        let has_credential = env_value
            .get("ANTHROPIC_API_KEY")
            .and_then(Value::as_str)
            .is_some_and(|k| !k.is_empty());
        if !has_credential {
            return Err(ValidationFailure::MissingCredential);
        }

        let env: ProfileEnv = field(env_value, "env")?;
        let description = optional_field::<String>(obj.get("description"), "description")?;
        let permissions = optional_field::<Permissions>(obj.get("permissions"), "permissions")?;
        let api_key_helper = optional_field::<String>(obj.get("apiKeyHelper"), "apiKeyHelper")?;

        Ok(Self(NewProfile {
            name: name.to_string(),
            description,
            env,
            permissions,
            api_key_helper,
        }))
    }

    /// Unwrap into profile creation input
    #[must_use]
    pub fn into_inner(self) -> NewProfile {
        self.0
    }
}

fn field<T: serde::de::DeserializeOwned>(
    value: &Value,
    name: &str,
) -> Result<T, ValidationFailure> {
    serde_json::from_value(value.clone()).map_err(|e| ValidationFailure::InvalidField {
        field: name.to_string(),
        message: e.to_string(),
    })
}

fn optional_field<T: serde::de::DeserializeOwned>(
    value: Option<&Value>,
    name: &str,
) -> Result<Option<T>, ValidationFailure> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => field(v, name).map(Some),
    }
}

/// Write exported profiles to a JSON file
///
/// A single export is written as an object, several as an array.
///
/// # Errors
/// Returns an error if the file cannot be written
pub fn write_exports(path: &Path, exports: &[ProfileExport]) -> Result<(), ExportError> {
    let json = match exports {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    fs::write(path, json)?;
    Ok(())
}

/// Read raw import payloads from a JSON file
///
/// Accepts a single profile object or an array of them. The payloads are not
/// validated here.
///
/// # Errors
/// Returns an error if the file cannot be read or is not JSON of the right shape
pub fn read_import_payloads(path: &Path) -> Result<Vec<Value>, ExportError> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => Ok(items),
        obj @ Value::Object(_) => Ok(vec![obj]),
        _ => Err(ExportError::UnexpectedShape),
    }
}
