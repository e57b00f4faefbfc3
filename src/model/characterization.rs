//! Turns raw client input into typed characteristics.
//!
//! Only declared names survive. Reference names are looked up so strategies see the
//! whole row, dates are parsed, and a characteristic that trumps another removes it.

use crate::ports::{CollaboratorError, RawCharacteristics, ReferenceData};
use crate::store::{Characteristics, Value};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicKind {
    /// A key into the named reference category.
    Reference(&'static str),
    Number,
    Text,
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct Declared {
    pub name: &'static str,
    pub kind: CharacteristicKind,
    /// Names dropped when this one is present.
    pub trumps: &'static [&'static str],
}

const fn has(name: &'static str, kind: CharacteristicKind) -> Declared {
    Declared { name, kind, trumps: &[] }
}

/// Client-facing inputs of a rail trip.
pub const RAIL_TRIP: &[Declared] = &[
    has("rail_class", CharacteristicKind::Reference("rail_class")),
    has("rail_traction", CharacteristicKind::Reference("rail_traction")),
    has("rail_company", CharacteristicKind::Reference("rail_company")),
    has("country", CharacteristicKind::Reference("country")),
    // Hours.
    has("duration", CharacteristicKind::Number),
    Declared { name: "distance_estimate", kind: CharacteristicKind::Number, trumps: &["duration"] },
    has("distance", CharacteristicKind::Number),
    has("speed", CharacteristicKind::Number),
    has("origin", CharacteristicKind::Text),
    has("destination", CharacteristicKind::Text),
    has("date", CharacteristicKind::Date),
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CharacterizationError {
    #[error("Cannot look up characteristic '{name}': {source}")]
    Collaborator { name: String, #[source] source: CollaboratorError },
}

pub struct Characterization {
    declared: &'static [Declared],
    reference: Arc<dyn ReferenceData>,
}

impl Characterization {
    pub fn new(declared: &'static [Declared], reference: Arc<dyn ReferenceData>) -> Self {
        Self { declared, reference }
    }

    pub fn rail_trip(reference: Arc<dyn ReferenceData>) -> Self {
        Self::new(RAIL_TRIP, reference)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.declared.iter().map(|d| d.name)
    }

    /// Unusable entries are dropped with a warning rather than failing the request:
    /// the resolver treats them as absent and falls back.
    pub fn characterize(&self, raw: &RawCharacteristics) -> Result<Characteristics, CharacterizationError> {
        let mut characteristics = Characteristics::new();

        for (name, raw_value) in raw {
            let Some(declared) = self.declared.iter().find(|d| d.name == name.as_str()) else {
                tracing::debug!(characteristic = %name, "ignoring undeclared characteristic");
                continue;
            };
            if raw_value.is_null() {
                continue;
            }
            let value = self.convert(declared, raw_value)?;
            if value.is_none() {
                tracing::warn!(characteristic = %name, value = %raw_value, "dropping unusable characteristic");
            }
            characteristics.insert_opt(declared.name, value);
        }

        for declared in self.declared {
            if characteristics.contains(declared.name) {
                for trumped in declared.trumps {
                    if characteristics.remove(trumped).is_some() {
                        tracing::debug!(characteristic = declared.name, trumped = *trumped, "trumped");
                    }
                }
            }
        }
        Ok(characteristics)
    }

    fn convert(&self, declared: &Declared, raw: &serde_json::Value) -> Result<Option<Value>, CharacterizationError> {
        let value = match declared.kind {
            CharacteristicKind::Number => number(raw).map(Value::Number),
            CharacteristicKind::Text => text(raw).map(Value::Text),
            CharacteristicKind::Date => text(raw).and_then(|s| s.parse::<NaiveDate>().ok()).map(Value::Date),
            CharacteristicKind::Reference(category) => {
                let Some(key) = text(raw) else { return Ok(None) };
                match self.reference.lookup(category, &key) {
                    Ok(record) => record.map(Value::record),
                    Err(source) if source.is_fatal() => {
                        return Err(CharacterizationError::Collaborator { name: declared.name.to_string(), source });
                    }
                    Err(e) => {
                        tracing::debug!(characteristic = declared.name, error = %e, "reference lookup failed");
                        None
                    }
                }
            }
        };
        Ok(value)
    }
}

fn number(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(raw: &serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryReferenceData, ReferenceData};
    use crate::store::Record;
    use rstest::rstest;
    use serde_json::json;

    struct Misconfigured;

    impl ReferenceData for Misconfigured {
        fn lookup(&self, _: &str, _: &str) -> Result<Option<Record>, CollaboratorError> {
            Err(CollaboratorError::configuration("reference data", "no database url"))
        }
    }

    fn characterization() -> Characterization {
        let data = InMemoryReferenceData::new()
            .with(Record::new("rail_class", "intercity").with("speed", 120.0))
            .with(Record::new("country", "US").with("rail_speed", 60.0));
        Characterization::rail_trip(Arc::new(data))
    }

    fn raw(value: serde_json::Value) -> RawCharacteristics {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_references_are_looked_up() {
        let chars = characterization()
            .characterize(&raw(json!({ "rail_class": "intercity", "country": "US", "duration": 2 })))
            .unwrap();
        let rec = chars.get("rail_class").and_then(Value::as_record).unwrap();
        assert_eq!(rec.number("speed"), Some(120.0));
        assert_eq!(chars.get("duration"), Some(&Value::Number(2.0)));
        assert_eq!(chars.len(), 3);
    }

    #[rstest]
    #[case::unknown_reference(json!({ "rail_class": "maglev" }))]
    #[case::null(json!({ "duration": null }))]
    #[case::undeclared(json!({ "seat": "12A" }))]
    #[case::not_a_number(json!({ "duration": "soon" }))]
    #[case::bad_date(json!({ "date": "someday" }))]
    #[case::blank_text(json!({ "origin": "  " }))]
    fn test_unusable_input_is_absent(#[case] input: serde_json::Value) {
        let chars = characterization().characterize(&raw(input)).unwrap();
        assert!(chars.is_empty());
    }

    #[test]
    fn test_scalars_are_typed() {
        let chars = characterization()
            .characterize(&raw(json!({ "date": "2010-06-01", "speed": "80", "origin": "Boston" })))
            .unwrap();
        assert_eq!(chars.get("date"), Some(&Value::Date(NaiveDate::from_ymd_opt(2010, 6, 1).unwrap())));
        assert_eq!(chars.get("speed"), Some(&Value::Number(80.0)));
        assert_eq!(chars.get("origin"), Some(&Value::Text("Boston".into())));
    }

    #[test]
    fn test_distance_estimate_trumps_duration() {
        let chars = characterization()
            .characterize(&raw(json!({ "distance_estimate": 500, "duration": 2 })))
            .unwrap();
        assert!(chars.contains("distance_estimate"));
        assert!(!chars.contains("duration"));
    }

    #[test]
    fn test_fatal_lookup_failure_is_reported() {
        let c = Characterization::rail_trip(Arc::new(Misconfigured));
        let err = c.characterize(&raw(json!({ "rail_class": "intercity" }))).unwrap_err();
        assert!(matches!(err, CharacterizationError::Collaborator { ref name, .. } if name == "rail_class"));
    }
}
