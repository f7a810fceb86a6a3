//! Submission validation.
//!
//! A field is missing when it is absent or falsy: `null`, `""`, `false`, `0`.
//! Strings are not trimmed. `age` must be a positive integer and may arrive
//! as a JSON number or a numeric string.

use crate::error::ValidationError;
use crate::types::{NewRegistration, SubmissionForm};
use serde_json::Value;

/// Check that every field is present and usable.
///
/// Fields are checked in form order (`firstName`, `age`, `phone`, `email`)
/// and the first offending one is reported.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first missing or invalid field.
pub fn validate(form: &SubmissionForm) -> Result<NewRegistration, ValidationError> {
    let first_name = required_text(form.first_name.as_deref(), "firstName")?;
    let age = required_age(form.age.as_ref())?;
    let phone = required_text(form.phone.as_deref(), "phone")?;
    let email = required_text(form.email.as_deref(), "email")?;

    Ok(NewRegistration {
        first_name,
        age,
        phone,
        email,
    })
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError::missing(field)),
    }
}

fn required_age(value: Option<&Value>) -> Result<u32, ValidationError> {
    const FIELD: &str = "age";

    match value {
        None | Some(Value::Null | Value::Bool(false)) => Err(ValidationError::missing(FIELD)),
        Some(Value::String(text)) if text.is_empty() => Err(ValidationError::missing(FIELD)),
        Some(Value::String(text)) => match text.parse::<u32>() {
            Ok(0) | Err(_) => Err(ValidationError::invalid(FIELD)),
            Ok(age) => Ok(age),
        },
        Some(Value::Number(number)) => {
            if let Some(age) = number.as_u64() {
                return match u32::try_from(age) {
                    Ok(0) => Err(ValidationError::missing(FIELD)),
                    Ok(age) => Ok(age),
                    Err(_) => Err(ValidationError::invalid(FIELD)),
                };
            }
            // -0 and 0.0 are falsy too
            if number.as_f64() == Some(0.0) {
                Err(ValidationError::missing(FIELD))
            } else {
                Err(ValidationError::invalid(FIELD))
            }
        }
        Some(Value::Bool(true) | Value::Array(_) | Value::Object(_)) => {
            Err(ValidationError::invalid(FIELD))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

    use super::*;
    use crate::error::FieldProblem;
    use proptest::prelude::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> SubmissionForm {
        serde_json::from_value(value).unwrap()
    }

    fn alice() -> serde_json::Value {
        json!({
            "firstName": "Alice",
            "age": 30,
            "phone": "0600000000",
            "email": "alice@example.com",
        })
    }

    #[test]
    fn test_complete_form_is_accepted() {
        let record = validate(&form(alice())).unwrap();

        assert_eq!(record.first_name, "Alice");
        assert_eq!(record.age, 30);
        assert_eq!(record.phone, "0600000000");
        assert_eq!(record.email, "alice@example.com");
    }

    #[test]
    fn test_age_as_numeric_string() {
        let mut body = alice();
        body["age"] = json!("42");

        assert_eq!(validate(&form(body)).unwrap().age, 42);
    }

    #[test]
    fn test_only_first_name() {
        let error = validate(&form(json!({ "firstName": "Bob" }))).unwrap_err();
        assert_eq!(error, ValidationError::missing("age"));
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for field in ["firstName", "age", "phone", "email"] {
            let mut body = alice();
            body.as_object_mut().unwrap().remove(field);

            let error = validate(&form(body)).unwrap_err();
            assert_eq!(error.field, field);
            assert_eq!(error.problem, FieldProblem::Missing);
        }
    }

    #[test]
    fn test_falsy_values_count_as_missing() {
        for (field, value) in [
            ("firstName", json!("")),
            ("firstName", json!(null)),
            ("age", json!(0)),
            ("age", json!(0.0)),
            ("age", json!("")),
            ("age", json!(false)),
            ("age", json!(null)),
            ("phone", json!("")),
            ("email", json!("")),
        ] {
            let mut body = alice();
            body[field] = value.clone();

            let error = validate(&form(body)).unwrap_err();
            assert_eq!(
                error,
                ValidationError::missing(field),
                "{field} = {value} should be missing"
            );
        }
    }

    #[test]
    fn test_unusable_ages_are_invalid() {
        for value in [
            json!(-3),
            json!(12.5),
            json!("douze"),
            json!("0"),
            json!(true),
            json!([30]),
            json!(u64::from(u32::MAX) + 1),
        ] {
            let mut body = alice();
            body["age"] = value.clone();

            let error = validate(&form(body)).unwrap_err();
            assert_eq!(error, ValidationError::invalid("age"), "age = {value}");
        }
    }

    #[test]
    fn test_whitespace_is_not_trimmed() {
        let mut body = alice();
        body["firstName"] = json!(" ");

        assert_eq!(validate(&form(body)).unwrap().first_name, " ");
    }

    proptest! {
        #[test]
        fn prop_positive_ages_round_trip(age in 1u32..=u32::MAX, as_string in any::<bool>()) {
            let mut body = alice();
            body["age"] = if as_string { json!(age.to_string()) } else { json!(age) };

            prop_assert_eq!(validate(&form(body)).unwrap().age, age);
        }

        #[test]
        fn prop_non_empty_text_is_kept(first_name in ".+", email in ".+") {
            let mut body = alice();
            body["firstName"] = json!(first_name.clone());
            body["email"] = json!(email.clone());

            let record = validate(&form(body)).unwrap();
            prop_assert_eq!(record.first_name, first_name);
            prop_assert_eq!(record.email, email);
        }
    }
}
