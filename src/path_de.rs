//! JSON documents with the JSON path of a failure in the error message.
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("at JSON path {path}: {message}")]
pub struct DocumentError {
    pub path: String,
    pub message: String,
}

impl<E: std::fmt::Display> From<serde_path_to_error::Error<E>> for DocumentError {
    fn from(err: serde_path_to_error::Error<E>) -> Self {
        let path = err.path().to_string();
        Self { path, message: err.into_inner().to_string() }
    }
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Case {
        name: String,
        width: u8,
    }

    #[test]
    fn reports_the_failing_field() {
        let err = from_str_with_path::<Vec<Case>>(r#"[{"name": "a", "width": 1}, {"name": "b", "width": 300}]"#)
            .unwrap_err();
        assert_eq!(err.path, "[1].width");
        assert!(err.to_string().starts_with("at JSON path [1].width: "));
    }

    #[test]
    fn untyped_documents_load() {
        let v: serde_json::Value = from_slice_with_path(br#"{"struct": {"a": "u8"}}"#).unwrap();
        assert_eq!(v["struct"]["a"], "u8");
    }
}
