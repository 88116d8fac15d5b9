//! Error types for the config adapter
//!
//! Every variant of [`AdapterError`] is fatal: a render either produces a
//! complete document or nothing at all.

use crate::path::PathError;
use crate::version::TargetVersion;

/// Errors raised while rendering, extracting or migrating a configuration
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Version string is not one of the supported majors
    #[error("unsupported router version: '{0}' (expected v1 or v2)")]
    UnsupportedVersion(String),

    /// Profile string is not `production` or `development`
    #[error("unsupported profile: '{0}' (expected production or development)")]
    UnsupportedProfile(String),

    /// Logical key (or leftover document path) has no table entry
    #[error("unknown setting: '{0}'")]
    UnknownSetting(String),

    /// Setting exists but cannot be expressed in the requested version
    #[error("setting '{key}' cannot be represented in router {version} configuration")]
    VersionIncompatibleSetting {
        key: String,
        version: TargetVersion,
    },

    /// Value has the wrong type for its setting
    #[error("invalid value for '{key}': expected {expected}, found {found}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Document could not be built or (de)serialized
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl AdapterError {
    /// Create version-incompatible error for key
    pub fn incompatible(key: impl Into<String>, version: TargetVersion) -> Self {
        Self::VersionIncompatibleSetting {
            key: key.into(),
            version,
        }
    }

    /// Offending setting key, when the error concerns one
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::UnknownSetting(key)
            | Self::VersionIncompatibleSetting { key, .. }
            | Self::InvalidValue { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<PathError> for AdapterError {
    fn from(err: PathError) -> Self {
        Self::Document(DocumentError::Path(err))
    }
}

/// Errors from the document tree and its serializers
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Document root is a scalar or list
    #[error("document root must be a mapping, found {0}")]
    NotAMapping(&'static str),

    /// Two values claim the same location
    #[error("conflicting values at '{0}'")]
    Conflict(String),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Result type alias for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_setting_display() {
        let err = AdapterError::UnknownSetting("cors.origin".to_string());
        assert_eq!(err.to_string(), "unknown setting: 'cors.origin'");
    }

    #[test]
    fn incompatible_display_names_version() {
        let err = AdapterError::incompatible("jwt.issuers", TargetVersion::V1);
        assert_eq!(
            err.to_string(),
            "setting 'jwt.issuers' cannot be represented in router v1 configuration"
        );
        assert_eq!(err.key(), Some("jwt.issuers"));
    }

    #[test]
    fn path_error_converts_to_document_error() {
        let err: AdapterError = PathError::EmptySegment.into();
        assert!(matches!(err, AdapterError::Document(DocumentError::Path(_))));
        assert_eq!(err.key(), None);
    }
}
