//! Render context assembly.

use serde_json::{Map, Value};

/// Merges `overlay` into `base`. Objects merge key by key, anything else replaces.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Adds the site settings and template variables to a caller's context.
///
/// A caller context that is not an object is kept under `value`.
pub fn build(context: Value, site: &Map<String, Value>, variables: &Map<String, Value>) -> Value {
    let mut context = match context {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };

    for (key, extra) in [("site", site), ("template", variables)] {
        let slot = context
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
        merge(slot, Value::Object(extra.clone()));
    }

    Value::Object(context)
}
