// Response decoding shared by both provider clients.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::Error;

/// Parse a full response body, keeping a preview of the body on failure.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        }
    })
}

/// Decode each element of a record list on its own.
///
/// An element whose shape does not match `T` at all is dropped with a
/// warning so one bad record never costs the rest of the batch.
pub(crate) fn decode_records<T: DeserializeOwned>(provider: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(provider, index, error = %e, "dropping undecodable record");
                None
            }
        })
        .collect()
}

/// Deserialize a list field that may be absent or `null` as an empty `Vec`.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Trim a response body for inclusion in an error message.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Item {
        name: String,
    }

    #[test]
    fn undecodable_records_are_skipped() {
        let items = vec![json!({"name": "a"}), json!(42), json!({"name": "b"})];
        let decoded: Vec<Item> = decode_records("test", items);
        let names: Vec<&str> = decoded.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "null_as_empty")]
        items: Vec<u32>,
    }

    #[test]
    fn null_and_missing_lists_become_empty() {
        let missing: Holder = serde_json::from_value(json!({})).unwrap();
        let null: Holder = serde_json::from_value(json!({"items": null})).unwrap();
        let full: Holder = serde_json::from_value(json!({"items": [1, 2]})).unwrap();
        assert!(missing.items.is_empty());
        assert!(null.items.is_empty());
        assert_eq!(full.items, vec![1, 2]);
    }

    #[test]
    fn parse_body_reports_preview() {
        let err = parse_body::<Item>("not json").unwrap_err();
        match err {
            Error::Deserialization { message, body } => {
                assert!(message.contains("not json"));
                assert_eq!(body, "not json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
