use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Deserialize with JSON-path context in error messages.
/// Text after the document is rejected.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, Error> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(with_path)?;
    de.end().map_err(|source| Error::Deserialize { path: ".".to_string(), source })?;
    Ok(value)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(with_path)
}

fn with_path(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    Error::Deserialize { path, source: err.into_inner() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Point {
        #[allow(dead_code)]
        x: i64,
        #[allow(dead_code)]
        tags: Vec<String>,
    }

    #[test]
    fn reports_nested_path() {
        let err = from_value_with_path::<Point>(json!({"x": 1, "tags": ["a", 2]})).unwrap_err();
        let Error::Deserialize { path, .. } = &err else { panic!("expected deserialize error") };
        assert_eq!(path, "tags[1]");
    }
}
