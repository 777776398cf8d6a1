//! Lenient field decoders shared by the backend record types.

use serde::{Deserialize, Deserializer};

/// Record ids are opaque: a JSON string or number, kept as text.
pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "super::id")]
        id: String,
    }

    #[test]
    fn accepts_strings_and_numbers() {
        let row: Row = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(row.id, "abc");
        let row: Row = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(row.id, "7");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(serde_json::from_str::<Row>(r#"{"id": null}"#).is_err());
        assert!(serde_json::from_str::<Row>(r#"{"id": [1]}"#).is_err());
    }
}
