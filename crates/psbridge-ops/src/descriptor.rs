//! Host action descriptor building.

use serde_json::{Map, Value, json};

/// Builder for one host action descriptor.
///
/// Every descriptor is an object naming the action in `_obj`; fields are
/// plain values, enumerations (`{_enum, _value}`), or unit values
/// (`{_unit, _value}`).
#[derive(Debug, Clone)]
pub struct Descriptor {
    fields: Map<String, Value>,
}

impl Descriptor {
    /// Start a descriptor for action `obj`.
    #[must_use]
    pub fn new(obj: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("_obj".to_string(), Value::String(obj.into()));
        Self { fields }
    }

    /// Set a plain field.
    #[must_use]
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Set an enumerated field.
    #[must_use]
    pub fn enumerated(self, key: &str, kind: &str, value: &str) -> Self {
        self.field(key, enumeration(kind, value))
    }

    /// Set a field with a unit.
    #[must_use]
    pub fn unit(self, key: &str, unit: &str, value: impl Into<Value>) -> Self {
        self.field(key, json!({ "_unit": unit, "_value": value.into() }))
    }

    /// Target the layer the host currently has selected.
    #[must_use]
    pub fn target_selected_layer(self) -> Self {
        self.field(
            "_target",
            json!([{ "_ref": "layer", "_enum": "ordinal", "_value": "targetEnum" }]),
        )
    }

    /// Finish as an executed command.
    #[must_use]
    pub fn build(self) -> Value {
        self.field("_isCommand", true).build_raw()
    }

    /// Finish without the command marker.
    #[must_use]
    pub fn build_raw(self) -> Value {
        Value::Object(self.fields)
    }
}

/// An enumeration value.
#[must_use]
pub fn enumeration(kind: &str, value: &str) -> Value {
    json!({ "_enum": kind, "_value": value })
}

/// A canvas point.
#[must_use]
pub fn paint_point(horizontal: i64, vertical: i64) -> Value {
    json!({ "_obj": "paint", "horizontal": horizontal, "vertical": vertical })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_command_descriptor() {
        let descriptor = Descriptor::new("pinch").field("amount", 50).build();
        assert_eq!(
            descriptor,
            json!({"_obj": "pinch", "amount": 50, "_isCommand": true})
        );
    }

    #[test]
    fn test_enumerated_and_unit_fields() {
        let descriptor = Descriptor::new("make")
            .enumerated("using", "userMaskEnabled", "revealAll")
            .unit("opacity", "percentUnit", 50.0)
            .build_raw();

        assert_eq!(descriptor["using"]["_enum"], "userMaskEnabled");
        assert_eq!(descriptor["using"]["_value"], "revealAll");
        assert_eq!(descriptor["opacity"]["_unit"], "percentUnit");
        assert!(descriptor.get("_isCommand").is_none());
    }

    #[test]
    fn test_selected_layer_target() {
        let descriptor = Descriptor::new("set").target_selected_layer().build();
        assert_eq!(descriptor["_target"][0]["_value"], "targetEnum");
    }
}
