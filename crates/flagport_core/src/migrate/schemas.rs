//! Supported legacy source formats.
//!
//! Each format names its table and columns and decodes its raw value
//! payload; everything else about the pipeline is shared by the engine.

use serde_json::Value;

/// Table/column layout and value decoding for one legacy source format.
pub trait SourceSchema {
    /// Source table name.
    const TABLE: &'static str;
    /// Column holding the feature name.
    const NAME_COLUMN: &'static str;
    /// Column holding the serialized context scope.
    const SCOPE_COLUMN: &'static str;
    /// Column holding the raw value payload.
    const VALUE_COLUMN: &'static str;

    /// Decodes the raw value column into a JSON value.
    ///
    /// # Errors
    /// Malformed payloads fail here and become per-context errors.
    fn decode_value(raw: &str) -> Result<Value, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Legacy `feature_flags` table: `name` / `scope` / `value`, values are
/// strict JSON.
pub struct FeatureFlagsSchema;

impl SourceSchema for FeatureFlagsSchema {
    const TABLE: &'static str = "feature_flags";
    const NAME_COLUMN: &'static str = "name";
    const SCOPE_COLUMN: &'static str = "scope";
    const VALUE_COLUMN: &'static str = "value";
}

/// Legacy `feature_states` table: `feature` / `context_scope` / `state`.
///
/// This format predates JSON payloads for boolean flags and stores the
/// bare literals `on` / `off`; anything else is regular JSON.
pub struct FeatureStatesSchema;

impl SourceSchema for FeatureStatesSchema {
    const TABLE: &'static str = "feature_states";
    const NAME_COLUMN: &'static str = "feature";
    const SCOPE_COLUMN: &'static str = "context_scope";
    const VALUE_COLUMN: &'static str = "state";

    fn decode_value(raw: &str) -> Result<Value, serde_json::Error> {
        match raw {
            "on" => Ok(Value::Bool(true)),
            "off" => Ok(Value::Bool(false)),
            other => serde_json::from_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureFlagsSchema, FeatureStatesSchema, SourceSchema};
    use serde_json::json;

    #[test]
    fn feature_flags_values_are_strict_json() {
        assert_eq!(FeatureFlagsSchema::decode_value("true").unwrap(), json!(true));
        assert_eq!(
            FeatureFlagsSchema::decode_value("\"on\"").unwrap(),
            json!("on")
        );
        assert!(FeatureFlagsSchema::decode_value("on").is_err());
        assert!(FeatureFlagsSchema::decode_value("not-json").is_err());
    }

    #[test]
    fn feature_states_accepts_legacy_on_off_literals() {
        assert_eq!(FeatureStatesSchema::decode_value("on").unwrap(), json!(true));
        assert_eq!(
            FeatureStatesSchema::decode_value("off").unwrap(),
            json!(false)
        );
        assert_eq!(
            FeatureStatesSchema::decode_value("{\"rollout\":25}").unwrap(),
            json!({"rollout": 25})
        );
        assert!(FeatureStatesSchema::decode_value("not-json").is_err());
    }
}
