//! Request and response bodies for the account endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Profile returned by `GET /account`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,
}

/// Body for `PUT /account`. The current password is required by the backend
/// to authorize any change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Plain `{message}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Verification {
    #[serde(default)]
    pub valid: bool,
}

fn lenient_age<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw = serde_json::Value::deserialize(d)?;
    Ok(match raw {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_age_accepts_string_or_number() {
        let a: Account = serde_json::from_str(r#"{"username": "kai", "age": "31"}"#).unwrap();
        assert_eq!(a.age, Some(31));
        let b: Account = serde_json::from_str(r#"{"username": "kai", "age": 40}"#).unwrap();
        assert_eq!(b.age, Some(40));
        let c: Account = serde_json::from_str(r#"{"username": "kai", "age": ""}"#).unwrap();
        assert_eq!(c.age, None);
    }

    #[test]
    fn account_update_omits_unset_fields() {
        let update = AccountUpdate {
            username: "kai".into(),
            password: "old".into(),
            new_password: Some("new".into()),
            age: None,
        };
        let json = serde_json::to_value(update).unwrap();
        assert_eq!(json["newPassword"], "new");
        assert!(json.get("age").is_none());
    }
}
