//! Cache-key conventions shared with every other reader and writer of the store.

use crate::error::FingerprintError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

const OUTPUT_PREFIX: &str = "output-";

/// Serializes `value` to JSON and base64-encodes the bytes.
///
/// The result is deterministic for identical input but sensitive to object
/// field order, so `{a, b}` and `{b, a}` produce different keys. This is a
/// cache address, not a digest.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, FingerprintError> {
    let json = serde_json::to_vec(value)?;
    Ok(STANDARD.encode(json))
}

/// The key raw source data is cached under: `"{calculation_key}-{fingerprint}"`.
pub fn input_key<T: Serialize + ?Sized>(calculation_key: &str, input: &T) -> Result<String, FingerprintError> {
    Ok(format!("{}-{}", calculation_key, fingerprint(input)?))
}

/// The key a calculation's final output is persisted under: `"output-{key}"`.
pub fn output_key(key: &str) -> String {
    format!("{OUTPUT_PREFIX}{key}")
}
