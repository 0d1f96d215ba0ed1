use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// JSON schema for `T` in the dialect strict structured-output endpoints accept: every
/// object closed with `additionalProperties: false`, every property required, and no
/// `$ref` indirection.
pub fn structured_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    close_objects(&mut value);
    inline_refs(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }

    value
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, nested) in map.iter_mut() {
                close_objects(nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                close_objects(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };

    if let Some(definitions) = definitions {
        inline_recursive(value, &definitions);
    }
}

fn inline_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref").cloned() {
                if let Some(name) = reference.strip_prefix("#/definitions/") {
                    if let Some(definition) = definitions.get(name) {
                        *value = definition.clone();
                        inline_recursive(value, definitions);
                        return;
                    }
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if let [single] = all_of.as_slice() {
                    *value = single.clone();
                    inline_recursive(value, definitions);
                    return;
                }
            }

            for (key, nested) in map.iter_mut() {
                if key != "definitions" {
                    inline_recursive(nested, definitions);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_recursive(item, definitions);
            }
        }
        _ => {}
    }
}
