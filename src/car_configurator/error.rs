use bevy::asset::{AssetLoadError, io::AssetReaderError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("failed to fetch {path}: {reason}")]
    AssetFetch { path: String, reason: String },
    #[error("unexpected failure loading {path}: {reason}")]
    Unexpected { path: String, reason: String },
    #[error("failed to read material roles from {path}: {reason}")]
    RoleMapping { path: String, reason: String },
}

impl LoadError {
    pub fn from_asset_error(path: &str, err: &AssetLoadError) -> Self {
        match err {
            AssetLoadError::AssetReaderError(
                reader_err @ (AssetReaderError::NotFound(_) | AssetReaderError::Io(_)),
            ) => LoadError::AssetFetch {
                path: path.to_string(),
                reason: reader_err.to_string(),
            },
            other => LoadError::Unexpected {
                path: path.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, LoadError::AssetFetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_file_is_a_fetch_failure() {
        let err = AssetLoadError::AssetReaderError(AssetReaderError::NotFound(PathBuf::from(
            "models/car.glb",
        )));
        let classified = LoadError::from_asset_error("models/car.glb", &err);
        assert!(classified.is_fetch_failure());
        assert!(classified.to_string().contains("models/car.glb"));
    }

    #[test]
    fn role_mapping_error_is_not_a_fetch_failure() {
        let err = LoadError::RoleMapping {
            path: "car.roles.ron".to_string(),
            reason: "expected map".to_string(),
        };
        assert!(!err.is_fetch_failure());
    }
}
