use super::structs::{ElsterType, ElsterValue};
use super::ElsterParseError;

/// Interprets a raw telegram value according to the index type.
///
/// Deterministic and side effect free. The only failure is a raw value with
/// no mapping in an enumerated type; callers report those and drop the
/// telegram.
pub fn interpret_elster_value(raw: u16, kind: ElsterType) -> Result<ElsterValue, ElsterParseError> {
    match kind {
        ElsterType::Integer => Ok(ElsterValue::Integer(raw)),
        ElsterType::Decimal(scale) => Ok(ElsterValue::Decimal {
            raw: raw as i16,
            scale,
        }),
        ElsterType::Bool => Ok(ElsterValue::Bool(raw != 0)),
        ElsterType::Enum(states) => states
            .iter()
            .copied()
            .find(|(value, _)| *value == raw)
            .map(|(_, name)| ElsterValue::State(name))
            .ok_or(ElsterParseError::UnknownEnumValue(raw)),
    }
}

/// MQTT topic of a reading: the configured prefix plus its topic name.
pub fn topic_for(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}
