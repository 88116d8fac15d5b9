//! Render requests and request manifests

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AdapterResult;
use crate::node::Node;
use crate::version::{Profile, TargetVersion};

/// Logical settings keyed by setting key
///
/// Sorted so that iteration, and everything derived from it, is
/// deterministic.
pub type SettingsMap = BTreeMap<String, Node>;

/// Immutable input to a single render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    target_version: TargetVersion,
    profile: Profile,
    settings: SettingsMap,
}

impl RenderRequest {
    /// Start building a request for `target_version`
    #[inline]
    #[must_use]
    pub fn builder(target_version: TargetVersion) -> RenderRequestBuilder {
        RenderRequestBuilder {
            target_version,
            profile: Profile::default(),
            settings: SettingsMap::new(),
        }
    }

    /// Build from textual version and profile, as received from a caller
    ///
    /// # Errors
    /// Returns [`AdapterError::UnsupportedVersion`] or
    /// [`AdapterError::UnsupportedProfile`] before looking at any setting
    pub fn parse(
        version: &str,
        profile: Option<&str>,
        settings: SettingsMap,
    ) -> AdapterResult<Self> {
        let target_version = version.parse::<TargetVersion>()?;
        let profile = profile.map(str::parse::<Profile>).transpose()?.unwrap_or_default();
        Ok(Self {
            target_version,
            profile,
            settings,
        })
    }

    #[inline]
    #[must_use]
    pub fn target_version(&self) -> TargetVersion {
        self.target_version
    }

    #[inline]
    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profile
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SettingsMap {
        &self.settings
    }
}

/// Builder for [`RenderRequest`]
#[derive(Debug, Clone)]
pub struct RenderRequestBuilder {
    target_version: TargetVersion,
    profile: Profile,
    settings: SettingsMap,
}

impl RenderRequestBuilder {
    #[must_use]
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Add one setting; a repeated key keeps the last value
    #[must_use]
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Node>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Add many settings at once
    #[must_use]
    pub fn settings(mut self, settings: impl IntoIterator<Item = (String, Node)>) -> Self {
        self.settings.extend(settings);
        self
    }

    #[must_use]
    pub fn build(self) -> RenderRequest {
        RenderRequest {
            target_version: self.target_version,
            profile: self.profile,
            settings: self.settings,
        }
    }
}

/// On-disk form of a request
///
/// ```yaml
/// target_version: v2
/// profile: production
/// settings:
///   cors.origins: ["https://studio.apollographql.com"]
/// ```
///
/// Version and profile stay as text until [`RequestManifest::into_request`]
/// so that a bad version is reported as [`AdapterError::UnsupportedVersion`]
/// rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestManifest {
    #[serde(default, deserialize_with = "version_text")]
    pub target_version: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub settings: SettingsMap,
}

impl RequestManifest {
    /// Resolve into a request; explicit overrides beat manifest values,
    /// which beat the defaults (`v2`, `development`)
    ///
    /// # Errors
    /// Returns error if the chosen version or profile is unsupported
    pub fn into_request(
        self,
        version_override: Option<&str>,
        profile_override: Option<&str>,
    ) -> AdapterResult<RenderRequest> {
        let version = version_override
            .or(self.target_version.as_deref())
            .unwrap_or(TargetVersion::V2.as_str());
        let profile = profile_override.or(self.profile.as_deref());
        RenderRequest::parse(version, profile, self.settings)
    }
}

/// `target_version: 2` is a YAML integer; read it as the text `"2"`
fn version_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;

    #[test]
    fn builder_defaults_to_development() {
        let request = RenderRequest::builder(TargetVersion::V1)
            .setting("cors.origins", Node::strings(["https://a.com"]))
            .build();
        assert_eq!(request.profile(), Profile::Development);
        assert_eq!(request.settings().len(), 1);
    }

    #[test]
    fn parse_rejects_unknown_version() {
        let err = RenderRequest::parse("v3", None, SettingsMap::new()).unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedVersion(_)));
    }

    #[test]
    fn manifest_from_yaml() {
        let manifest: RequestManifest = serde_yaml::from_str(
            "target_version: v1\nprofile: production\nsettings:\n  limits.max_depth: 10\n",
        )
        .unwrap();
        let request = manifest.into_request(None, None).unwrap();
        assert_eq!(request.target_version(), TargetVersion::V1);
        assert_eq!(request.profile(), Profile::Production);
        assert_eq!(
            request.settings().get("limits.max_depth"),
            Some(&Node::Integer(10))
        );
    }

    #[test]
    fn manifest_overrides_win() {
        let manifest = RequestManifest {
            target_version: Some("v1".to_string()),
            profile: Some("production".to_string()),
            settings: SettingsMap::new(),
        };
        let request = manifest.into_request(Some("v2"), Some("dev")).unwrap();
        assert_eq!(request.target_version(), TargetVersion::V2);
        assert_eq!(request.profile(), Profile::Development);
    }

    #[test]
    fn manifest_defaults() {
        let request = RequestManifest::default().into_request(None, None).unwrap();
        assert_eq!(request.target_version(), TargetVersion::V2);
        assert_eq!(request.profile(), Profile::Development);
    }

    #[test]
    fn manifest_rejects_unknown_fields() {
        let result: Result<RequestManifest, _> = serde_yaml::from_str("version: v2\n");
        assert!(result.is_err());
    }

    #[test]
    fn manifest_bad_version_is_unsupported() {
        let manifest: RequestManifest = serde_yaml::from_str("target_version: v7\n").unwrap();
        assert!(matches!(
            manifest.into_request(None, None),
            Err(AdapterError::UnsupportedVersion(ref v)) if v == "v7"
        ));
    }

    #[test]
    fn manifest_numeric_version() {
        let manifest: RequestManifest =
            serde_yaml::from_str("target_version: 2
settings: {}
").unwrap();
        assert_eq!(manifest.target_version.as_deref(), Some("2"));
        let request = manifest.into_request(None, None).unwrap();
        assert_eq!(request.target_version(), TargetVersion::V2);

        let manifest: RequestManifest = serde_json::from_str(r#"{"target_version": 1}"#).unwrap();
        let request = manifest.into_request(None, None).unwrap();
        assert_eq!(request.target_version(), TargetVersion::V1);
    }

    #[test]
    fn manifest_numeric_bad_version_is_unsupported() {
        let manifest: RequestManifest = serde_yaml::from_str("target_version: 7
").unwrap();
        assert!(matches!(
            manifest.into_request(None, None),
            Err(AdapterError::UnsupportedVersion(ref v)) if v == "7"
        ));
    }
}
