//! Data types exchanged with the activation key service.
//!
//! Everything here is created and mutated by the backend; the console only
//! holds transient copies.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ConsoleError;

/// Literal the service uses in place of an expiry timestamp.
pub const NEVER_EXPIRES: &str = "Never expires";

/// Product an activation key is issued for.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppName {
    #[default]
    WaBomb,
    MailStorm,
    /// Application name the console does not know about.
    Other(String),
}

impl AppName {
    /// The two products keys can be generated for.
    pub const SUPPORTED: [AppName; 2] = [AppName::WaBomb, AppName::MailStorm];

    pub fn as_str(&self) -> &str {
        match self {
            AppName::WaBomb => "wa-bomb",
            AppName::MailStorm => "mail-storm",
            AppName::Other(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AppName::Other(_))
    }
}

impl From<String> for AppName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "wa-bomb" => AppName::WaBomb,
            "mail-storm" => AppName::MailStorm,
            _ => AppName::Other(value),
        }
    }
}

impl From<AppName> for String {
    fn from(value: AppName) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for AppName {
    type Err = ConsoleError;

    /// Parses only the supported products.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match AppName::from(s.trim().to_string()) {
            AppName::Other(name) => Err(ConsoleError::validation(
                "app_name",
                format!("unknown application '{name}' (expected wa-bomb or mail-storm)"),
            )),
            app => Ok(app),
        }
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a timestamp as sent by the service.
///
/// Accepts RFC 3339 and naive ISO-8601 (read as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Read an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}

/// Expiry of an activation key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expiry {
    #[default]
    Never,
    At(DateTime<Utc>),
}

impl Expiry {
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => *at < now,
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expiry::Never => serializer.serialize_none(),
            Expiry::At(at) => serializer.serialize_some(&at.to_rfc3339()),
        }
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") | Some(NEVER_EXPIRES) => Ok(Expiry::Never),
            Some(s) => parse_timestamp(s)
                .map(Expiry::At)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid expiry '{s}'"))),
        }
    }
}

/// Whether a key was issued without an expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidityType {
    Lifetime,
    Limited,
}

/// Derived state of an activation record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Expired,
    Deactivated,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyStatus::Active => "active",
            KeyStatus::Expired => "expired",
            KeyStatus::Deactivated => "deactivated",
        };
        f.write_str(s)
    }
}

/// One issued activation key as stored by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    #[serde(rename = "app_name", default, deserialize_with = "null_as_default")]
    pub app: AppName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub system_id: String,
    pub activation_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,
    #[serde(default)]
    pub customer_mobile: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_email: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Expiry,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
    #[serde(default)]
    pub validity_days: Option<u32>,
}

impl ActivationRecord {
    pub fn status(&self, now: DateTime<Utc>) -> KeyStatus {
        if !self.is_active {
            KeyStatus::Deactivated
        } else if self.expires_at.is_past(now) {
            KeyStatus::Expired
        } else {
            KeyStatus::Active
        }
    }

    /// Mobile number, treating an empty string as absent.
    pub fn mobile(&self) -> Option<&str> {
        self.customer_mobile.as_deref().filter(|m| !m.is_empty())
    }
}

/// Result of a verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    pub message: String,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_mobile: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<Expiry>,
    #[serde(default)]
    pub validity_type: Option<ValidityType>,
}

/// A freshly issued key, as echoed back by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedKey {
    pub activation_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub system_id: String,
    #[serde(rename = "app_name", default, deserialize_with = "null_as_default")]
    pub app: AppName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,
    #[serde(default)]
    pub customer_mobile: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_email: String,
    #[serde(default)]
    pub validity_days: Option<u32>,
    #[serde(default)]
    pub validity_type: Option<ValidityType>,
    #[serde(default)]
    pub message: String,
}

/// Contact details the service attaches to a customer's statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mobile: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
}

impl CustomerInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// Key counts for one bucket (overall or per application).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyCounts {
    pub total: u32,
    pub active: u32,
    pub expired: u32,
    pub deactivated: u32,
}

/// Aggregated view of one customer's keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerStats {
    pub customer: Option<CustomerInfo>,
    pub totals: KeyCounts,
    pub apps: BTreeMap<AppName, KeyCounts>,
    /// Oldest first.
    pub activations: Vec<ActivationRecord>,
}

/// Answer to `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Answer to `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub supported_apps: Vec<String>,
    #[serde(default)]
    pub endpoints: Vec<String>,
}
