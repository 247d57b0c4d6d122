//! Loads the saves-preset JSON: an object mapping a short key to a list
//! of wanted-save expression strings (each optionally `expr#label`).

use std::collections::HashMap;

use crate::error::Error;

/// Parses the saves-preset JSON at `path`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the file cannot be read or is not a
/// JSON object mapping strings to arrays of strings.
pub fn load_presets(path: &str) -> Result<HashMap<String, Vec<String>>, Error> {
    let contents = fs_err::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::Validation(format!("could not parse saves preset file {}: {}", path, e)))
}

/// Looks up every key in `keys`, concatenating their expression lists in
/// the order given, erroring on the first key not found in `presets`.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first missing key.
pub fn resolve_keys(presets: &HashMap<String, Vec<String>>, keys: &[String]) -> Result<Vec<String>, Error> {
    let mut raw = Vec::new();
    for key in keys {
        match presets.get(key) {
            Some(expressions) => raw.extend(expressions.iter().cloned()),
            None => return Err(Error::Validation(format!("key {} not found in saves preset file", key))),
        }
    }
    Ok(raw)
}
