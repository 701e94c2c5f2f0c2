// Recursive structural merge for JSON option trees.
//
// Works on `serde_json::Value` so it is independent of any option schema.

use serde_json::Value;

/// Deep merge `overlay` over `base`, returning a new value.
///
/// * object + object: keys are merged recursively; keys present only in
///   `base` are kept.
/// * array + array: merged by index. Element `i` of the overlay is merged
///   over element `i` of the base; base elements past the overlay's length
///   are kept.
/// * anything else: the overlay value replaces the base value. This covers
///   scalars and `null`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Array(a), Value::Array(b)) => {
            let mut merged: Vec<Value> = b
                .iter()
                .enumerate()
                .map(|(i, v)| match a.get(i) {
                    Some(existing) => deep_merge(existing, v),
                    None => v.clone(),
                })
                .collect();
            merged.extend(a.iter().skip(b.len()).cloned());
            Value::Array(merged)
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                let value = match merged.get(k) {
                    Some(existing) => deep_merge(existing, v),
                    None => v.clone(),
                };
                merged.insert(k.clone(), value);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Set `value` at a dotted `path` inside `target`, creating intermediate
/// objects. A non-object found along the path is replaced by an object.
pub fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let Value::Object(map) = current else {
            unreachable!("replaced with an object above");
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}
