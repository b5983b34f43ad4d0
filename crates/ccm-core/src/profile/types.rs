//! Profile types and conversions to the external settings shape

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved id of the profile mirroring the external settings file
pub const CURRENT_PROFILE_ID: &str = "current";

/// Display name given to the mirror when it is synthesized from a file read
pub const CURRENT_PROFILE_NAME: &str = "Current Configuration";

/// Endpoint written when a profile does not specify one
pub const DEFAULT_ENDPOINT: &str = ccm_providers::DEFAULT_BASE_URL;

const ID_PREFIX: &str = "config_";
const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Environment block of a profile
///
/// Field names on the wire are the environment variables Claude Code reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEnv {
    /// API credential
    #[serde(rename = "ANTHROPIC_API_KEY", default)]
    pub credential: String,
    /// Remote endpoint override
    #[serde(
        rename = "ANTHROPIC_BASE_URL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint: Option<String>,
    /// Numeric flag disabling non-essential traffic
    #[serde(
        rename = "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_flag"
    )]
    pub disable_nonessential_traffic: Option<u32>,
}

impl ProfileEnv {
    /// Create an env block holding only a credential
    #[must_use]
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            ..Self::default()
        }
    }
}

/// Other tools write the flag as `"1"` or `true`; normalize to a number.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(u32::from(b))),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid flag value: {n}"))),
        Some(Value::String(s)) => match s.trim() {
            "" => Ok(None),
            "true" => Ok(Some(1)),
            "false" => Ok(Some(0)),
            other => other
                .parse::<u32>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid flag value: {other}"))),
        },
        Some(other) => Err(de::Error::custom(format!("invalid flag value: {other}"))),
    }
}

/// Tool permission rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Rules that are allowed, in order
    #[serde(default)]
    pub allow: Vec<String>,
    /// Rules that are denied, in order
    #[serde(default)]
    pub deny: Vec<String>,
}

/// A named set of credentials and policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Unique identifier, immutable after creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Environment settings
    pub env: ProfileEnv,
    /// Permission rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// Credential helper command, passed through as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_helper: Option<String>,
    /// Whether this profile is the one written to the settings file.
    /// Derived from the registry's active pointer.
    #[serde(default)]
    pub is_active: bool,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build a new, inactive profile with a fresh id
    #[must_use]
    pub fn new(data: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            name: data.name,
            description: data.description,
            env: data.env,
            permissions: data.permissions,
            api_key_helper: data.api_key_helper,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Synthesize the `"current"` mirror from settings file content
    #[must_use]
    pub fn mirror_of(config: &ExternalConfig, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CURRENT_PROFILE_ID.to_string(),
            name: name.into(),
            description: None,
            env: config.env.clone(),
            permissions: Some(config.permissions.clone()),
            api_key_helper: config.api_key_helper.clone(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the reserved settings file mirror
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.id == CURRENT_PROFILE_ID
    }

    /// Convert to the settings file shape, filling defaults
    #[must_use]
    pub fn to_external(&self) -> ExternalConfig {
        ExternalConfig {
            env: ProfileEnv {
                credential: self.env.credential.clone(),
                endpoint: Some(
                    self.env
                        .endpoint
                        .clone()
                        .filter(|e| !e.is_empty())
                        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
                ),
                disable_nonessential_traffic: Some(
                    self.env.disable_nonessential_traffic.unwrap_or(0),
                ),
            },
            permissions: self.permissions.clone().unwrap_or_default(),
            api_key_helper: self.api_key_helper.clone(),
        }
    }

    /// Profile content without registry bookkeeping
    #[must_use]
    pub fn to_new_profile(&self) -> NewProfile {
        NewProfile {
            name: self.name.clone(),
            description: self.description.clone(),
            env: self.env.clone(),
            permissions: self.permissions.clone(),
            api_key_helper: self.api_key_helper.clone(),
        }
    }
}

/// Input for creating a profile (no id, no timestamps)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    /// Display name
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

impl NewProfile {
    /// Minimal profile input: a name and a credential
    #[must_use]
    pub fn new(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            env: ProfileEnv::with_credential(credential),
            ..Self::default()
        }
    }
}

/// Partial update of a profile
///
/// `None` leaves a field untouched. For the optional string fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub env: Option<ProfileEnv>,
    pub permissions: Option<Option<Permissions>>,
    pub api_key_helper: Option<Option<String>>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.env.is_none()
            && self.permissions.is_none()
            && self.api_key_helper.is_none()
    }

    pub(crate) fn apply_to(self, profile: &mut Profile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(description) = self.description {
            profile.description = description;
        }
        if let Some(env) = self.env {
            profile.env = env;
        }
        if let Some(permissions) = self.permissions {
            profile.permissions = permissions;
        }
        if let Some(helper) = self.api_key_helper {
            profile.api_key_helper = helper;
        }
    }
}

/// Content of the external settings file managed by this engine
///
/// The file has no notion of named profiles, ids or timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConfig {
    /// Environment settings
    #[serde(default)]
    pub env: ProfileEnv,
    /// Permission rules
    #[serde(default)]
    pub permissions: Permissions,
    /// Credential helper command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_helper: Option<String>,
}

/// Generate a profile id: `config_<unix-millis>_<9 base36 chars>`
#[must_use]
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{ID_PREFIX}{}_{suffix}", Utc::now().timestamp_millis())
}
