//! Content hashing of render requests.
//!
//! The cache key is the SHA-256 of a canonical JSON encoding of the whole
//! request. Canonical means:
//! - object keys sorted (serde_json's default map is ordered),
//! - no insignificant whitespace,
//! - floats in shortest round-trip form, so `5`, `5.0` and `5.00` in the
//!   payload all encode as `5.0`,
//! - negative zero written as zero.

use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::error::MapResult;
use crate::request::RenderRequest;

/// Canonical byte encoding of a request.
pub fn canonical_json(request: &RenderRequest) -> MapResult<Vec<u8>> {
    let mut value = serde_json::to_value(request)?;
    normalize(&mut value);
    Ok(serde_json::to_vec(&value)?)
}

/// Hex SHA-256 of the canonical encoding.
pub fn content_hash(request: &RenderRequest) -> MapResult<String> {
    let bytes = canonical_json(request)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn normalize(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if n.is_f64() && n.as_f64() == Some(0.0) {
                if let Some(zero) = Number::from_f64(0.0) {
                    *n = zero;
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize),
        Value::Object(map) => map.values_mut().for_each(normalize),
        _ => {}
    }
}
