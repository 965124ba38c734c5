use serde_json::{Map, Value};

/// Free-form document fields default to an empty object when callers omit
/// them.
pub fn normalize_document(value: Option<Value>) -> Value {
	value.unwrap_or(Value::Object(Default::default()))
}

/// Returns `value` with every object key rewritten to its canonical form:
/// trimmed, lowercased, non-alphanumeric runs collapsed to a single
/// underscore. Arrays are walked; nested objects are rewritten recursively.
///
/// Best effort by contract: if `value` is not an object, if any key
/// canonicalizes to the empty string, or if two keys collapse onto the same
/// canonical form, the raw stored value is returned unchanged. Callers must
/// tolerate either key representation.
pub fn symbolize(value: &Value) -> Value {
	if !value.is_object() {
		return value.clone();
	}

	symbolize_value(value).unwrap_or_else(|| value.clone())
}

/// Canonical form of a single key, or `None` when nothing survives.
pub fn canonical_key(raw: &str) -> Option<String> {
	let mut out = String::with_capacity(raw.len());
	let mut pending_separator = false;

	for ch in raw.trim().chars() {
		if ch.is_alphanumeric() {
			if pending_separator && !out.is_empty() {
				out.push('_');
			}

			pending_separator = false;

			out.extend(ch.to_lowercase());
		} else {
			pending_separator = true;
		}
	}

	if out.is_empty() { None } else { Some(out) }
}

fn symbolize_value(value: &Value) -> Option<Value> {
	match value {
		Value::Object(entries) => {
			let mut out = Map::with_capacity(entries.len());

			for (key, inner) in entries {
				let canonical = canonical_key(key)?;
				let rewritten = symbolize_value(inner)?;

				// A collision would silently drop a field.
				if out.insert(canonical, rewritten).is_some() {
					return None;
				}
			}

			Some(Value::Object(out))
		},
		Value::Array(items) => {
			let rewritten = items.iter().map(symbolize_value).collect::<Option<Vec<_>>>()?;

			Some(Value::Array(rewritten))
		},
		other => Some(other.clone()),
	}
}
