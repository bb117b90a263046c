//! # Person Record
//!
//! Normalized row persisted for every successfully fetched detail payload.

use serde_json::{Map, Value};
use thiserror::Error;

/// Attribute columns, in storage order (after the `id` key)
pub const PERSON_ATTRIBUTES: [&str; 8] = [
    "name",
    "birth_year",
    "eye_color",
    "gender",
    "hair_color",
    "homeworld",
    "mass",
    "skin_color",
];

/// Detail payload did not have the expected `result.uid` / `result.properties` shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedPayload {
    #[error("payload has no `result` object")]
    MissingResult,

    #[error("payload has no non-empty `result.properties` mapping")]
    MissingProperties,

    #[error("payload has no `result.uid`")]
    MissingUid,

    #[error("`result.uid` is not an integer: {0}")]
    InvalidUid(String),
}

/// One row of the `people` table.
///
/// Every write replaces all attributes for the key, so a `None` here clears
/// whatever the previous harvest stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct PersonRecord {
    pub id: i64,
    pub name: Option<String>,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub homeworld: Option<String>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
}

impl PersonRecord {
    /// Normalize a detail payload:
    /// `{"result": {"uid": "1", "properties": {"name": "Luke", ...}}}`.
    ///
    /// The key is `result.uid` of the payload itself, not the identifier the
    /// detail URL was built from. Unknown properties are ignored.
    pub fn from_detail(payload: &Value) -> Result<Self, MalformedPayload> {
        let result = payload
            .get("result")
            .and_then(Value::as_object)
            .filter(|result| !result.is_empty())
            .ok_or(MalformedPayload::MissingResult)?;

        let properties = result
            .get("properties")
            .and_then(Value::as_object)
            .filter(|properties| !properties.is_empty())
            .ok_or(MalformedPayload::MissingProperties)?;

        let id = parse_uid(result.get("uid").ok_or(MalformedPayload::MissingUid)?)?;

        Ok(Self {
            id,
            name: attribute(properties, "name"),
            birth_year: attribute(properties, "birth_year"),
            eye_color: attribute(properties, "eye_color"),
            gender: attribute(properties, "gender"),
            hair_color: attribute(properties, "hair_color"),
            homeworld: attribute(properties, "homeworld"),
            mass: attribute(properties, "mass"),
            skin_color: attribute(properties, "skin_color"),
        })
    }

    /// Attribute values in [`PERSON_ATTRIBUTES`] order
    pub fn attributes(&self) -> [Option<&str>; 8] {
        [
            self.name.as_deref(),
            self.birth_year.as_deref(),
            self.eye_color.as_deref(),
            self.gender.as_deref(),
            self.hair_color.as_deref(),
            self.homeworld.as_deref(),
            self.mass.as_deref(),
            self.skin_color.as_deref(),
        ]
    }
}

fn parse_uid(raw: &Value) -> Result<i64, MalformedPayload> {
    match raw {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| MalformedPayload::InvalidUid(number.to_string())),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| MalformedPayload::InvalidUid(text.clone())),
        Value::Null => Err(MalformedPayload::MissingUid),
        other => Err(MalformedPayload::InvalidUid(other.to_string())),
    }
}

/// Scalars become text; null, empty strings, zero, `false` and nested values become NULL.
fn attribute(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_full_payload() {
        let payload = json!({
            "message": "ok",
            "result": {
                "uid": "1",
                "properties": {
                    "name": "Luke Skywalker",
                    "birth_year": "19BBY",
                    "eye_color": "blue",
                    "gender": "male",
                    "hair_color": "blond",
                    "homeworld": "https://www.swapi.tech/api/planets/1",
                    "mass": "77",
                    "skin_color": "fair",
                    "height": "172",
                    "created": "2025-01-01T00:00:00.000Z"
                }
            }
        });

        let record = PersonRecord::from_detail(&payload).unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name.as_deref(), Some("Luke Skywalker"));
        assert_eq!(record.birth_year.as_deref(), Some("19BBY"));
        assert_eq!(record.homeworld.as_deref(), Some("https://www.swapi.tech/api/planets/1"));
        assert_eq!(record.skin_color.as_deref(), Some("fair"));
    }

    #[test]
    fn missing_and_empty_attributes_become_none() {
        let payload = json!({
            "result": {
                "uid": 5,
                "properties": {"name": "Leia", "mass": "", "gender": null, "hair_color": ["brown"]}
            }
        });

        let record = PersonRecord::from_detail(&payload).unwrap();
        assert_eq!(record.id, 5);
        assert_eq!(record.name.as_deref(), Some("Leia"));
        assert_eq!(record.mass, None);
        assert_eq!(record.gender, None);
        assert_eq!(record.hair_color, None);
        assert_eq!(record.eye_color, None);
    }

    #[test]
    fn numeric_properties_are_stored_as_text() {
        let payload = json!({"result": {"uid": "9", "properties": {"mass": 84, "birth_year": 19.5}}});
        let record = PersonRecord::from_detail(&payload).unwrap();
        assert_eq!(record.mass.as_deref(), Some("84"));
        assert_eq!(record.birth_year.as_deref(), Some("19.5"));
    }

    #[test]
    fn zero_and_false_are_treated_as_absent() {
        let payload = json!({
            "result": {
                "uid": "10",
                "properties": {"name": "Obi-Wan", "mass": 0, "birth_year": 0.0, "gender": false}
            }
        });
        let record = PersonRecord::from_detail(&payload).unwrap();
        assert_eq!(record.name.as_deref(), Some("Obi-Wan"));
        assert_eq!(record.mass, None);
        assert_eq!(record.birth_year, None);
        assert_eq!(record.gender, None);
    }

    #[test]
    fn key_comes_from_payload_uid() {
        let payload = json!({"result": {"uid": " 0042 ", "properties": {"name": "Biggs"}}});
        assert_eq!(PersonRecord::from_detail(&payload).unwrap().id, 42);
    }

    #[test]
    fn rejects_payloads_without_nested_structure() {
        assert_eq!(
            PersonRecord::from_detail(&json!({"message": "not found"})),
            Err(MalformedPayload::MissingResult)
        );
        assert_eq!(
            PersonRecord::from_detail(&json!({"result": {"uid": "1"}})),
            Err(MalformedPayload::MissingProperties)
        );
        assert_eq!(
            PersonRecord::from_detail(&json!({"result": {"uid": "1", "properties": {}}})),
            Err(MalformedPayload::MissingProperties)
        );
        assert_eq!(
            PersonRecord::from_detail(&json!({"result": {"properties": {"name": "x"}}})),
            Err(MalformedPayload::MissingUid)
        );
        assert!(matches!(
            PersonRecord::from_detail(&json!({"result": {"uid": "abc", "properties": {"name": "x"}}})),
            Err(MalformedPayload::InvalidUid(_))
        ));
    }

    #[test]
    fn attributes_follow_column_order() {
        let record = PersonRecord {
            id: 1,
            name: Some("a".into()),
            skin_color: Some("h".into()),
            ..PersonRecord::default()
        };
        let attributes = record.attributes();
        assert_eq!(attributes.len(), PERSON_ATTRIBUTES.len());
        assert_eq!(attributes[0], Some("a"));
        assert_eq!(attributes[7], Some("h"));
        assert_eq!(attributes[3], None);
    }
}
