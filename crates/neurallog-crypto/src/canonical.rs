//! Canonical JSON serialization.
//!
//! Log payloads are canonicalized (sorted object keys, no whitespace) before
//! encryption so the same logical document always produces the same
//! plaintext bytes, making round-trips reproducible and tamper-evident.

use serde_json::Value;

use crate::error::CryptoError;

/// Serialize a JSON value to its canonical string form.
///
/// Object keys are sorted lexicographically at every nesting level. Fails
/// with `NonFiniteNumber` on NaN/Infinity, which JSON cannot represent.
pub fn canonical_json(value: &Value) -> Result<String, CryptoError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() {
                return Err(CryptoError::NonFiniteNumber);
            }
            Ok(serde_json::to_string(n).unwrap())
        }
        Value::String(s) => Ok(serde_json::to_string(s).unwrap()),
        Value::Array(arr) => {
            let mut items = Vec::with_capacity(arr.len());
            for item in arr {
                items.push(canonical_json(item)?);
            }
            Ok(format!("[{}]", items.join(",")))
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut pairs = Vec::with_capacity(keys.len());
            for key in keys {
                pairs.push(format!(
                    "{}:{}",
                    serde_json::to_string(key).unwrap(),
                    canonical_json(&obj[key])?
                ));
            }
            Ok(format!("{{{}}}", pairs.join(",")))
        }
    }
}
