//! Registration data types.
//!
//! A submission travels through three shapes:
//!
//! ```text
//! SubmissionForm  --validate-->  NewRegistration  --insert-->  Registration
//! (raw JSON body)                (checked fields)              (stored record)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw registration form as posted by the client.
///
/// Every field is optional here; presence is checked by
/// [`crate::validation::validate`]. `age` stays an untyped JSON value because
/// HTML forms post it as a string while API clients send a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    /// Registrant's first name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Registrant's age (number or numeric string)
    #[serde(default)]
    pub age: Option<serde_json::Value>,
    /// Registrant's phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Registrant's email address
    #[serde(default)]
    pub email: Option<String>,
}

/// A validated registration, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    /// First name (non-empty)
    pub first_name: String,
    /// Age (positive)
    pub age: u32,
    /// Phone number (non-empty)
    pub phone: String,
    /// Contact email (non-empty)
    pub email: String,
}

impl NewRegistration {
    /// Identity key used for duplicate detection
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            first_name: &self.first_name,
            email: &self.email,
        }
    }
}

/// The `(first_name, email)` pair that must be unique across stored registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey<'a> {
    /// First name
    pub first_name: &'a str,
    /// Email address
    pub email: &'a str,
}

impl fmt::Display for IdentityKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.first_name, self.email)
    }
}

/// A stored registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Store-assigned id, increasing with insertion order
    pub id: i64,
    /// First name
    pub first_name: String,
    /// Age
    pub age: u32,
    /// Phone number
    pub phone: String,
    /// Contact email
    pub email: String,
    /// When the store accepted the record
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Build the stored record from its validated fields.
    #[must_use]
    pub fn from_new(id: i64, record: &NewRegistration, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: record.first_name.clone(),
            age: record.age,
            phone: record.phone.clone(),
            email: record.email.clone(),
            created_at,
        }
    }

    /// Identity key of this record
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey<'_> {
        IdentityKey {
            first_name: &self.first_name,
            email: &self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use inscriptions_core::environment::Clock;
    use inscriptions_testing::test_clock;

    #[test]
    fn test_form_accepts_camel_case_and_missing_fields() {
        let form: SubmissionForm =
            serde_json::from_str(r#"{"firstName":"Bob","age":"31","extra":true}"#).unwrap();

        assert_eq!(form.first_name.as_deref(), Some("Bob"));
        assert_eq!(form.age, Some(serde_json::json!("31")));
        assert!(form.phone.is_none());
        assert!(form.email.is_none());
    }

    #[test]
    fn test_identity_key_matches_between_shapes() {
        let record = NewRegistration {
            first_name: "Alice".to_string(),
            age: 30,
            phone: "0600000000".to_string(),
            email: "alice@example.com".to_string(),
        };
        let stored = Registration::from_new(7, &record, test_clock().now());

        assert_eq!(record.identity_key(), stored.identity_key());
        assert_eq!(stored.identity_key().to_string(), "Alice <alice@example.com>");
    }

    #[test]
    fn test_registration_serializes_camel_case() {
        let record = NewRegistration {
            first_name: "Alice".to_string(),
            age: 30,
            phone: "0600000000".to_string(),
            email: "alice@example.com".to_string(),
        };
        let json = serde_json::to_value(Registration::from_new(1, &record, test_clock().now()))
            .unwrap();

        assert_eq!(json["firstName"], "Alice");
        assert_eq!(json["createdAt"], "2025-01-01T00:00:00Z");
    }
}
