//! Form state for the generate, verify and customer-stats views.
//!
//! Forms hold raw text exactly as typed. Checks happen only when a form is
//! turned into a request.

use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::api::{GenerateKeyRequest, VerifyKeyRequest};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::models::AppName;

/// Loose `local@domain.tld` shape, the same bar a browser email input sets.
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Key lifetime selected on the generate form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validity {
    /// Never expires.
    #[default]
    Lifetime,
    /// Expires after the entered number of days.
    Limited,
}

impl FromStr for Validity {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lifetime" => Ok(Validity::Lifetime),
            "limited" => Ok(Validity::Limited),
            other => Err(ConsoleError::validation(
                "validity",
                format!("expected 'lifetime' or 'limited', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validity::Lifetime => f.write_str("Lifetime (Never expires)"),
            Validity::Limited => f.write_str("Limited time"),
        }
    }
}

fn required(value: &str, field: &str) -> ConsoleResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConsoleError::validation(field, "is required"));
    }
    Ok(value.to_string())
}

fn validate_email(value: &str, field: &str) -> ConsoleResult<String> {
    let value = required(value, field)?;
    let email_regex = Regex::new(EMAIL_PATTERN)
        .map_err(|e| ConsoleError::Config(format!("email pattern: {e}")))?;
    if !email_regex.is_match(&value) {
        return Err(ConsoleError::validation(field, "is not a valid email address"));
    }
    Ok(value)
}

fn parse_validity_days(value: &str) -> ConsoleResult<u32> {
    let days = required(value, "validity_days")?;
    match days.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConsoleError::validation(
            "validity_days",
            "must be a whole number of days greater than zero",
        )),
    }
}

fn unknown_field(form: &str, field: &str, known: &str) -> ConsoleError {
    ConsoleError::validation(
        field,
        format!("not a field of the {form} form (fields: {known})"),
    )
}

/// Fields of the generate view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateForm {
    pub app: AppName,
    pub system_id: String,
    pub customer_name: String,
    pub customer_mobile: String,
    pub customer_email: String,
    pub validity: Validity,
    /// Raw text of the days input; only meaningful for `Validity::Limited`.
    pub validity_days: String,
}

impl GenerateForm {
    pub const FIELDS: &'static str = "app, system-id, name, mobile, email, validity, days";

    /// Whether the days input is shown at all.
    pub fn shows_validity_days(&self) -> bool {
        self.validity == Validity::Limited
    }

    /// Update one field from user input.
    pub fn set_field(&mut self, field: &str, value: &str) -> ConsoleResult<()> {
        match field {
            "app" => self.app = value.parse()?,
            "system-id" | "system_id" => self.system_id = value.to_string(),
            "name" => self.customer_name = value.to_string(),
            "mobile" => self.customer_mobile = value.to_string(),
            "email" => self.customer_email = value.to_string(),
            "validity" => self.validity = value.parse()?,
            "days" => {
                self.validity_days = value.to_string();
                self.validity = Validity::Limited;
            }
            other => return Err(unknown_field("generate", other, Self::FIELDS)),
        }
        Ok(())
    }

    /// Check the form and build the request payload.
    pub fn to_request(&self) -> ConsoleResult<GenerateKeyRequest> {
        let system_id = required(&self.system_id, "system_id")?;
        let customer_name = required(&self.customer_name, "customer_name")?;
        let customer_email = validate_email(&self.customer_email, "customer_email")?;

        let mobile = self.customer_mobile.trim();
        let customer_mobile = (!mobile.is_empty()).then(|| mobile.to_string());

        let validity_days = match self.validity {
            Validity::Lifetime => None,
            Validity::Limited => Some(parse_validity_days(&self.validity_days)?),
        };

        Ok(GenerateKeyRequest {
            system_id,
            app_name: self.app.clone(),
            customer_name,
            customer_mobile,
            customer_email,
            validity_days,
        })
    }
}

/// Fields of the verify view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifyForm {
    pub app: AppName,
    pub system_id: String,
    pub activation_key: String,
}

impl VerifyForm {
    pub const FIELDS: &'static str = "app, system-id, key";

    pub fn set_field(&mut self, field: &str, value: &str) -> ConsoleResult<()> {
        match field {
            "app" => self.app = value.parse()?,
            "system-id" | "system_id" => self.system_id = value.to_string(),
            "key" => self.activation_key = value.to_string(),
            other => return Err(unknown_field("verify", other, Self::FIELDS)),
        }
        Ok(())
    }

    pub fn to_request(&self) -> ConsoleResult<VerifyKeyRequest> {
        Ok(VerifyKeyRequest {
            system_id: required(&self.system_id, "system_id")?,
            activation_key: required(&self.activation_key, "activation_key")?,
            app_name: self.app.clone(),
        })
    }
}

/// Email typed into the customer-stats view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsQuery {
    pub email: String,
}

impl StatsQuery {
    pub const FIELDS: &'static str = "email";

    pub fn set_field(&mut self, field: &str, value: &str) -> ConsoleResult<()> {
        match field {
            "email" => self.email = value.to_string(),
            other => return Err(unknown_field("customer stats", other, Self::FIELDS)),
        }
        Ok(())
    }

    /// The email to query, or `None` when nothing was entered.
    pub fn email(&self) -> Option<&str> {
        Some(self.email.trim()).filter(|e| !e.is_empty())
    }
}
