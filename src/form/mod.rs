//! Contact form draft handling.
//!
//! The draft is a plain record of what the visitor typed. Updates replace one
//! field at a time and never validate; validation runs right before a submit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A single input on the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
    Subject,
    Message,
}

impl Field {
    /// All fields in the order they appear on the form.
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Subject,
        Field::Message,
    ];

    /// Key used in the intake payload.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Phone => "Phone",
            Field::Subject => "Subject",
            Field::Message => "Message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "phone" => Ok(Field::Phone),
            "subject" => Ok(Field::Subject),
            "message" => Ok(Field::Message),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// How the phone input behaves on a given revision of the site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhonePolicy {
    /// Not on the form at all; the key is left out of the payload.
    Omitted,
    #[default]
    Optional,
    Required,
}

/// Rules applied when a draft is validated and serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormRules {
    pub phone: PhonePolicy,
}

impl FormRules {
    pub fn is_required(&self, field: Field) -> bool {
        match field {
            Field::Phone => self.phone == PhonePolicy::Required,
            _ => true,
        }
    }
}

/// Why a draft was refused before any network call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("invalid form fields: {}", join_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<Field>,
}

impl ValidationError {
    /// Human-readable reasons, one per offending field.
    pub fn reasons(&self, draft: &DraftRecord) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| {
                if draft.get(*field).trim().is_empty() {
                    format!("{} is required", field.label())
                } else {
                    format!("{} is not valid", field.label())
                }
            })
            .collect()
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// What the visitor has typed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl DraftRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    /// Replace one field and return the resulting record.
    pub fn update(mut self, field: Field, value: impl Into<String>) -> Self {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Subject => &mut self.subject,
            Field::Message => &mut self.message,
        };
        *slot = value.into();
        self
    }

    pub fn reset() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| self.get(*f).is_empty())
    }

    pub fn validate(&self, rules: &FormRules) -> Result<(), ValidationError> {
        let fields = Field::ALL
            .into_iter()
            .filter(|field| !self.field_is_valid(*field, rules))
            .collect::<Vec<_>>();

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }

    fn field_is_valid(&self, field: Field, rules: &FormRules) -> bool {
        let value = self.get(field).trim();
        if value.is_empty() {
            return !rules.is_required(field);
        }
        match field {
            Field::Email => looks_like_email(value),
            _ => true,
        }
    }

    /// JSON body for the intake service.
    pub fn payload(&self, rules: &FormRules) -> Value {
        let mut body = Map::new();
        for field in Field::ALL {
            if field == Field::Phone && rules.phone == PhonePolicy::Omitted {
                continue;
            }
            body.insert(
                field.key().to_string(),
                Value::String(self.get(field).to_string()),
            );
        }
        Value::Object(body)
    }
}

/// `local@domain`, one `@`, no whitespace.
fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> DraftRecord {
        DraftRecord::reset()
            .update(Field::Name, "John Doe")
            .update(Field::Email, "john@x.com")
            .update(Field::Subject, "Test")
            .update(Field::Message, "Hello")
    }

    #[test]
    fn test_update_replaces_only_named_field() {
        let draft = filled().update(Field::Subject, "Pentest quote");
        assert_eq!(draft.subject, "Pentest quote");
        assert_eq!(draft.name, "John Doe");
        assert_eq!(draft.email, "john@x.com");
        assert_eq!(draft.message, "Hello");
        assert!(draft.phone.is_empty());
    }

    #[test]
    fn test_update_is_idempotent() {
        let once = filled().update(Field::Phone, "+1 555 0100");
        let twice = filled()
            .update(Field::Phone, "+1 555 0100")
            .update(Field::Phone, "+1 555 0100");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reset_is_all_empty() {
        let draft = DraftRecord::reset();
        assert!(draft.is_empty());
        assert!(!filled().is_empty());
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("Email".parse::<Field>(), Ok(Field::Email));
        assert_eq!(" message ".parse::<Field>(), Ok(Field::Message));
        assert!("company".parse::<Field>().is_err());
    }

    #[test]
    fn test_validate_accepts_complete_draft() {
        assert!(filled().validate(&FormRules::default()).is_ok());
    }

    #[test]
    fn test_validate_lists_missing_fields_in_form_order() {
        let draft = DraftRecord::reset()
            .update(Field::Message, "hi")
            .update(Field::Name, "   ");
        let err = draft.validate(&FormRules::default()).unwrap_err();
        assert_eq!(err.fields, vec![Field::Name, Field::Email, Field::Subject]);
        assert_eq!(err.to_string(), "invalid form fields: name, email, subject");
    }

    #[test]
    fn test_validate_email_shape() {
        let rules = FormRules::default();
        for bad in ["john", "john@", "@x.com", "jo hn@x.com", "a@b@c"] {
            let err = filled().update(Field::Email, bad).validate(&rules).unwrap_err();
            assert_eq!(err.fields, vec![Field::Email], "{bad} should be rejected");
        }

        let draft = filled().update(Field::Email, "john");
        let err = draft.validate(&rules).unwrap_err();
        assert_eq!(err.reasons(&draft), vec!["Email is not valid".to_string()]);
    }

    #[test]
    fn test_phone_policy() {
        let required = FormRules {
            phone: PhonePolicy::Required,
        };
        let err = filled().validate(&required).unwrap_err();
        assert_eq!(err.fields, vec![Field::Phone]);
        assert_eq!(err.reasons(&filled()), vec!["Phone is required".to_string()]);
        assert!(filled()
            .update(Field::Phone, "+1 555 0100")
            .validate(&required)
            .is_ok());
    }

    #[test]
    fn test_payload_keys_follow_phone_policy() {
        let draft = filled();
        let with_phone = draft.payload(&FormRules::default());
        let keys: Vec<&String> = with_phone.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(with_phone["name"], "John Doe");
        assert_eq!(with_phone["phone"], "");

        let without_phone = draft.payload(&FormRules {
            phone: PhonePolicy::Omitted,
        });
        assert!(without_phone.get("phone").is_none());
        assert_eq!(without_phone.as_object().unwrap().len(), 4);
    }
}
