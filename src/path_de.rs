use serde::de::DeserializeOwned;
use serde_json::Value;

/// A deserialization failure with the path of the offending value.
#[derive(Debug, Clone)]
pub struct PathError {
    /// Dotted path relative to the deserialized value, `None` at its root.
    pub path: Option<String>,
    pub message: String,
}

impl PathError {
    /// Render the path under `prefix`, e.g. `options.optional`.
    pub fn path_under(&self, prefix: &str) -> String {
        match &self.path {
            None => prefix.to_string(),
            Some(path) if path.starts_with('[') => format!("{prefix}{path}"),
            Some(path) => format!("{prefix}.{path}"),
        }
    }
}

/// Deserialize a fixed-shape value, keeping the path context of the error.
pub fn from_value_with_path<T: DeserializeOwned>(value: &Value) -> Result<T, PathError> {
    match serde_path_to_error::deserialize::<_, T>(value.clone()) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            let path = if path == "." { None } else { Some(path) };
            Err(PathError { path, message: err.into_inner().to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Pair {
        symbol: String,
        source: String,
    }

    #[test]
    fn errors_carry_the_element_path() {
        let value = serde_json::json!([
            { "symbol": "Span", "source": "locations" },
            { "symbol": 3, "source": "x" },
        ]);
        let err = from_value_with_path::<Vec<Pair>>(&value).unwrap_err();
        assert_eq!(err.path_under("externs"), "externs[1].symbol");
    }
}
