//! Device record parsing
//!
//! The device prints one JSON object per line:
//!
//! ```text
//! {"water_level": 42.37, "gas_level": 512}      data
//! {"event": "boot", "fw": "1.2.0"}              control, skipped
//! ```

use drainguard_core::reading::round_to;
use drainguard_core::{Reading, ReadingValidator, ValidationError};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field carrying the water distance
pub const WATER_KEY: &str = "water_level";

/// Field carrying the gas level
pub const GAS_KEY: &str = "gas_level";

/// Marker of a control record
pub const EVENT_KEY: &str = "event";

/// Rejected record
#[derive(Debug, Error)]
pub enum RecordError {
    /// Line is not JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Line is JSON but not an object
    #[error("record is not a JSON object")]
    NotObject,

    /// Field present but not a number
    #[error("field {0} is not a number")]
    NonNumeric(&'static str),

    /// Values failed boundary validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Control or event message
    Control(Map<String, Value>),
    /// Sample fields, not yet validated
    Sample {
        /// Water distance, if present
        water: Option<f64>,
        /// Gas level, if present
        gas: Option<f64>,
    },
}

impl Record {
    /// Parse one trimmed, non-empty line
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let object = match serde_json::from_str::<Value>(line)? {
            Value::Object(object) => object,
            _ => return Err(RecordError::NotObject),
        };

        if object.contains_key(EVENT_KEY) {
            return Ok(Record::Control(object));
        }

        Ok(Record::Sample {
            water: numeric_field(&object, WATER_KEY)?,
            gas: numeric_field(&object, GAS_KEY)?,
        })
    }
}

fn numeric_field(object: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, RecordError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(RecordError::NonNumeric(key)),
    }
}

/// Validate sample fields into a reading stamped with the receipt time
pub fn to_reading(
    validator: &ReadingValidator,
    water: Option<f64>,
    gas: Option<f64>,
) -> Result<Reading, RecordError> {
    let water = water.map(|w| round_to(w, 2));
    Ok(validator.validate_sample(water, gas)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainguard_core::constants::sensors::{
        GAS_LEVEL_MAX, GAS_LEVEL_MIN, WATER_LEVEL_MAX_CM, WATER_LEVEL_MIN_CM,
    };
    use proptest::prelude::*;

    #[test]
    fn data_record() {
        let record = Record::parse(r#"{"water_level": 42.375, "gas_level": 512}"#).unwrap();
        assert_eq!(
            record,
            Record::Sample {
                water: Some(42.375),
                gas: Some(512.0)
            }
        );
        let reading = to_reading(&ReadingValidator::default(), Some(42.375), Some(512.0)).unwrap();
        assert_eq!(reading.water_level_cm, 42.38);
        assert_eq!(reading.gas_level, 512);
    }

    #[test]
    fn event_record_is_control() {
        let record = Record::parse(r#"{"event": "boot", "water_level": 1}"#).unwrap();
        assert!(matches!(record, Record::Control(ref map) if map["event"] == "boot"));
    }

    #[test]
    fn malformed_records() {
        assert!(matches!(Record::parse("{not json"), Err(RecordError::Json(_))));
        assert!(matches!(Record::parse("[1, 2]"), Err(RecordError::NotObject)));
        assert!(matches!(
            Record::parse(r#"{"water_level": "high", "gas_level": 3}"#),
            Err(RecordError::NonNumeric("water_level"))
        ));
    }

    #[test]
    fn missing_and_out_of_range_fail_validation() {
        let validator = ReadingValidator::default();
        assert!(matches!(
            to_reading(&validator, None, Some(400.0)),
            Err(RecordError::Validation(ValidationError::MissingField { .. }))
        ));
        assert!(matches!(
            to_reading(&validator, Some(40.0), Some(5000.0)),
            Err(RecordError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    proptest! {
        #[test]
        fn accepted_samples_are_in_range(
            water in prop::option::of(-500.0f64..500.0),
            gas in prop::option::of(-1_000.0f64..6_000.0),
        ) {
            let mut fields = Vec::new();
            if let Some(water) = water {
                fields.push(format!("\"water_level\": {}", water));
            }
            if let Some(gas) = gas {
                fields.push(format!("\"gas_level\": {}", gas));
            }
            let line = format!("{{{}}}", fields.join(", "));

            let Ok(Record::Sample { water, gas }) = Record::parse(&line) else {
                return Err(TestCaseError::fail(format!("unparsed: {}", line)));
            };
            if let Ok(reading) = to_reading(&ReadingValidator::default(), water, gas) {
                prop_assert!((WATER_LEVEL_MIN_CM..=WATER_LEVEL_MAX_CM).contains(&reading.water_level_cm));
                prop_assert!((GAS_LEVEL_MIN..=GAS_LEVEL_MAX).contains(&reading.gas_level));
                prop_assert!(water.is_some() && gas.is_some());
            }
        }

        #[test]
        fn arbitrary_lines_never_yield_out_of_range(line in "\\PC{0,64}") {
            if let Ok(Record::Sample { water, gas }) = Record::parse(&line) {
                if let Ok(reading) = to_reading(&ReadingValidator::default(), water, gas) {
                    prop_assert!((WATER_LEVEL_MIN_CM..=WATER_LEVEL_MAX_CM).contains(&reading.water_level_cm));
                    prop_assert!(reading.gas_level <= GAS_LEVEL_MAX);
                }
            }
        }
    }
}
