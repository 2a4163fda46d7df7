use serde::de::DeserializeOwned;

/// A JSON decoding failure together with where in the document it happened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at JSON path {path} → {message}")]
pub struct PathError {
    pub path: String,
    pub message: String,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, PathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| PathError {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}
