//! Config adapter: render, extract and migrate
//!
//! [`ConfigAdapter`] is a pure transform. It reads the static
//! [`SettingsTable`], never touches the filesystem or the clock, and returns
//! either a complete [`RenderResult`] or an error with nothing rendered.

use std::fmt;

use tracing::{debug, warn};

use crate::digest::DocumentDigest;
use crate::document::ConfigDocument;
use crate::error::{AdapterError, AdapterResult, DocumentError};
use crate::node::Node;
use crate::path::{DocPath, Segment};
use crate::request::{RenderRequest, SettingsMap};
use crate::table::{self, match_pattern, substitute, SettingsTable, VersionedSetting};
use crate::validation::{default_passes, PassContext, ValidationPass};
use crate::version::{Profile, TargetVersion};
use crate::warning::{Warning, WarningCode};

/// Output of a successful render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    version: TargetVersion,
    profile: Profile,
    document: ConfigDocument,
    warnings: Vec<Warning>,
}

impl RenderResult {
    #[inline]
    #[must_use]
    pub fn version(&self) -> TargetVersion {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profile
    }

    #[inline]
    #[must_use]
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Warnings in the order the passes ran
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// # Errors
    /// Returns error if YAML serialization fails
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        self.document.to_yaml()
    }

    /// # Errors
    /// Returns error if JSON serialization fails
    pub fn to_json(&self) -> Result<String, DocumentError> {
        self.document.to_json()
    }

    /// # Errors
    /// Returns error if YAML serialization fails
    pub fn digest(&self) -> Result<DocumentDigest, DocumentError> {
        self.document.digest()
    }

    /// Read the logical settings back out of the rendered document
    ///
    /// # Errors
    /// Propagates extraction errors; none are expected for a document this
    /// adapter rendered itself
    pub fn to_settings_map(&self) -> AdapterResult<SettingsMap> {
        ConfigAdapter::new()
            .extract(&self.document, self.version)
            .map(|extraction| extraction.settings)
    }
}

/// Settings read back from a document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub settings: SettingsMap,
    /// Notes about legacy spellings that were accepted
    pub notes: Vec<Warning>,
}

/// One rendered setting waiting to be merged
struct Fragment<'a> {
    rank: usize,
    key: &'a str,
    path: DocPath,
    node: Node,
}

/// Version-aware router configuration adapter
pub struct ConfigAdapter {
    table: &'static SettingsTable,
    passes: Vec<Box<dyn ValidationPass>>,
}

impl fmt::Debug for ConfigAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigAdapter")
            .field("settings", &self.table.len())
            .field(
                "passes",
                &self.passes.iter().map(|p| p.code()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for ConfigAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigAdapter {
    /// Adapter over the built-in table and validation passes
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: table::table(),
            passes: default_passes(),
        }
    }

    /// Replace the validation passes
    #[must_use]
    pub fn with_passes(mut self, passes: Vec<Box<dyn ValidationPass>>) -> Self {
        self.passes = passes;
        self
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &'static SettingsTable {
        self.table
    }

    /// Render a request into a version-specific document
    ///
    /// Settings are translated one by one through the table, merged in
    /// table order, then checked by every validation pass.
    ///
    /// # Errors
    /// - [`AdapterError::UnknownSetting`] for a key with no table row
    /// - [`AdapterError::InvalidValue`] for a value of the wrong type
    /// - [`AdapterError::VersionIncompatibleSetting`] for a setting the
    ///   target version cannot express
    /// - [`AdapterError::Document`] if two settings collide in the tree
    pub fn render(&self, request: &RenderRequest) -> AdapterResult<RenderResult> {
        let version = request.target_version();
        let mut fragments = Vec::with_capacity(request.settings().len());

        for (key, value) in request.settings() {
            let found = self
                .table
                .lookup(key)
                .ok_or_else(|| AdapterError::UnknownSetting(key.clone()))?;
            let setting = found.setting;
            setting.kind.check(key, value)?;
            let shape = setting
                .shape(version)
                .ok_or_else(|| AdapterError::incompatible(key.as_str(), version))?;

            match shape.transform.render(key, value, version)? {
                Some(node) => {
                    let path = shape.resolve(&found.captures)?;
                    debug!(key = %key, path = %path, version = %version, "rendered setting");
                    fragments.push(Fragment {
                        rank: found.rank,
                        key: key.as_str(),
                        path,
                        node,
                    });
                }
                None => debug!(key = %key, version = %version, "setting renders to nothing"),
            }
        }

        // Settings iterate in key order already; a stable sort keeps that
        // order inside each table row.
        fragments.sort_by_key(|f| f.rank);

        let mut document = ConfigDocument::new();
        for fragment in fragments {
            let key = fragment.key;
            document
                .insert(&fragment.path, fragment.node)
                .map_err(|err| {
                    debug!(key = %key, error = %err, "setting collides with an earlier one");
                    AdapterError::Document(err)
                })?;
        }

        let warnings = self.validate(&document, version, request.profile());
        Ok(RenderResult {
            version,
            profile: request.profile(),
            document,
            warnings,
        })
    }

    /// Run every validation pass over a document, in order
    #[must_use]
    pub fn validate(
        &self,
        document: &ConfigDocument,
        version: TargetVersion,
        profile: Profile,
    ) -> Vec<Warning> {
        let ctx = PassContext {
            document,
            version,
            profile,
        };
        let mut warnings = Vec::new();
        for pass in &self.passes {
            for warning in pass.check(&ctx) {
                warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
                warnings.push(warning);
            }
        }
        warnings
    }

    /// Read logical settings out of a `version` document
    ///
    /// The inverse of [`render`](Self::render). Anything in the document
    /// that no table row claims is reported, never skipped.
    ///
    /// # Errors
    /// - [`AdapterError::UnknownSetting`] naming the first unclaimed path
    /// - [`AdapterError::InvalidValue`] for a claimed value of the wrong type
    pub fn extract(
        &self,
        document: &ConfigDocument,
        version: TargetVersion,
    ) -> AdapterResult<Extraction> {
        let mut residual = Residual::new(document);
        let mut extraction = Extraction::default();

        for setting in self.table.iter().filter(|s| s.canonical) {
            let Some(shape) = setting.shape(version) else {
                continue;
            };
            if setting.is_pattern() {
                extract_pattern(setting, &shape.template()?, &mut residual, &mut extraction)?;
                continue;
            }

            let path = shape.template()?;
            let taken = match residual.claim(&path) {
                Some(node) => Some(node),
                None => take_legacy(setting, version, &mut residual, &mut extraction)?,
            };
            if let Some(node) = taken {
                let value = shape.transform.invert(node);
                setting.kind.check(setting.key, &value)?;
                extraction.settings.insert(setting.key.to_string(), value);
            }
        }

        if let Some(path) = residual.unclaimed() {
            return Err(AdapterError::UnknownSetting(path.to_string()));
        }
        Ok(extraction)
    }

    /// Extract from `from`, then render the same settings for `to`
    ///
    /// Extraction notes come first in the result, followed by the usual
    /// validation warnings.
    ///
    /// # Errors
    /// Any extraction or render error
    pub fn migrate(
        &self,
        document: &ConfigDocument,
        from: TargetVersion,
        to: TargetVersion,
        profile: Profile,
    ) -> AdapterResult<RenderResult> {
        let extraction = self.extract(document, from)?;
        debug!(
            from = %from,
            to = %to,
            settings = extraction.settings.len(),
            "migrating configuration"
        );
        let request = RenderRequest::builder(to)
            .profile(profile)
            .settings(extraction.settings)
            .build();
        let mut result = self.render(&request)?;
        let mut warnings = extraction.notes;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }
}

/// Document content not yet claimed by any table row
///
/// Removal prunes empty containers, so the empty ones present in the input
/// are recorded up front. Such a container only counts as claimed when a
/// claimed path covers it.
struct Residual {
    document: ConfigDocument,
    empty: Vec<DocPath>,
    claimed: Vec<DocPath>,
}

impl Residual {
    fn new(document: &ConfigDocument) -> Self {
        Self {
            document: document.clone(),
            empty: document.empty_container_paths(),
            claimed: Vec::new(),
        }
    }

    fn claim(&mut self, path: &DocPath) -> Option<Node> {
        let node = self.document.remove(path)?;
        self.claimed.push(path.clone());
        Some(node)
    }

    /// First leftover value, then the first empty container nobody claimed
    fn unclaimed(&self) -> Option<DocPath> {
        self.document.first_content_path().or_else(|| {
            self.empty
                .iter()
                .find(|path| !self.claimed.iter().any(|c| c.is_prefix_of(path)))
                .cloned()
        })
    }
}

/// Claim every entry under a pattern row's fixed prefix
fn extract_pattern(
    setting: &VersionedSetting,
    template: &DocPath,
    residual: &mut Residual,
    extraction: &mut Extraction,
) -> AdapterResult<()> {
    let Some(at) = template
        .iter()
        .position(|seg| seg.as_key().is_some_and(|k| k.contains('{')))
    else {
        return Ok(());
    };
    let (prefix, rest) = template.split_at(at);
    let Some(Segment::Key(pattern)) = rest.segments().first() else {
        return Ok(());
    };
    let Some(entries) = residual.document.get(&prefix).and_then(Node::as_map) else {
        return Ok(());
    };

    let claimed: Vec<_> = entries
        .keys()
        .filter_map(|name| match_pattern(pattern, name).map(|caps| (name.clone(), caps)))
        .collect();
    for (name, captures) in claimed {
        let Some(value) = residual.claim(&prefix.child(name)) else {
            continue;
        };
        let key = substitute(setting.key, &captures);
        setting.kind.check(&key, &value)?;
        extraction.settings.insert(key, value);
    }
    Ok(())
}

fn take_legacy(
    setting: &VersionedSetting,
    version: TargetVersion,
    residual: &mut Residual,
    extraction: &mut Extraction,
) -> AdapterResult<Option<Node>> {
    let Some(legacy) = setting.v1_legacy.filter(|_| version == TargetVersion::V1) else {
        return Ok(None);
    };
    let path: DocPath = legacy.parse()?;
    let taken = residual.claim(&path);
    if taken.is_some() {
        extraction.notes.push(Warning::new(
            WarningCode::LegacyOperationLimits,
            legacy,
            format!("read as `{}`", setting.key),
        ));
    }
    Ok(taken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: TargetVersion) -> crate::request::RenderRequestBuilder {
        RenderRequest::builder(version)
    }

    #[test]
    fn render_v1_cors() {
        let result = ConfigAdapter::new()
            .render(
                &request(TargetVersion::V1)
                    .setting("cors.origins", Node::strings(["https://a.com"]))
                    .build(),
            )
            .unwrap();
        assert_eq!(result.to_yaml().unwrap(), "cors:\n  origins:\n  - https://a.com\n");
        assert!(!result.has_warnings());
    }

    #[test]
    fn render_rejects_unknown_key() {
        let err = ConfigAdapter::new()
            .render(&request(TargetVersion::V2).setting("cors.origin", "x").build())
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownSetting(ref k) if k == "cors.origin"));
    }

    #[test]
    fn render_rejects_wrong_type() {
        let err = ConfigAdapter::new()
            .render(
                &request(TargetVersion::V2)
                    .setting("limits.max_depth", "deep")
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::InvalidValue { ref key, found: "string", .. } if key == "limits.max_depth"
        ));
    }

    #[test]
    fn render_orders_by_table_not_input() {
        let result = ConfigAdapter::new()
            .render(
                &request(TargetVersion::V2)
                    .setting("limits.max_depth", 5_i64)
                    .setting("cors.origins", Node::strings(["a"]))
                    .setting("supergraph.listen", "0.0.0.0:4000")
                    .build(),
            )
            .unwrap();
        let keys: Vec<_> = result.document().root().keys().cloned().collect();
        assert_eq!(keys, vec!["supergraph", "cors", "limits"]);
    }

    #[test]
    fn render_empty_issuers_for_v1_writes_nothing() {
        let result = ConfigAdapter::new()
            .render(
                &request(TargetVersion::V1)
                    .setting("jwt.issuers", Node::List(vec![]))
                    .build(),
            )
            .unwrap();
        assert!(result.document().is_empty());
    }

    #[test]
    fn extract_reports_unclaimed_content() {
        let document =
            ConfigDocument::from_yaml("cors:\n  origins: [a]\ncoprocessor:\n  url: x\n").unwrap();
        let err = ConfigAdapter::new()
            .extract(&document, TargetVersion::V1)
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownSetting(ref p) if p == "coprocessor.url"));
    }

    #[test]
    fn extract_v2_policies_into_origins() {
        let document =
            ConfigDocument::from_yaml("cors:\n  policies:\n    - origins: [a, b]\n").unwrap();
        let extraction = ConfigAdapter::new()
            .extract(&document, TargetVersion::V2)
            .unwrap();
        assert_eq!(
            extraction.settings.get("cors.origins"),
            Some(&Node::strings(["a", "b"]))
        );
    }

    #[test]
    fn extract_second_policy_is_unclaimed() {
        let document = ConfigDocument::from_yaml(
            "cors:\n  policies:\n    - origins: [a]\n    - origins: [b]\n",
        )
        .unwrap();
        let err = ConfigAdapter::new()
            .extract(&document, TargetVersion::V2)
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::UnknownSetting(ref p) if p.starts_with("cors.policies[1]")
        ));
    }

    #[test]
    fn extract_reports_empty_section() {
        let document = ConfigDocument::from_yaml("coprocessor: {}
").unwrap();
        let err = ConfigAdapter::new()
            .extract(&document, TargetVersion::V1)
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownSetting(ref p) if p == "coprocessor"));
    }

    #[test]
    fn extract_reports_empty_list_beside_claimed_key() {
        let document = ConfigDocument::from_yaml(
            "cors:\n  origins: [a]\n  match_origins: []\ncoprocessor: {}\n",
        )
        .unwrap();
        let err = ConfigAdapter::new()
            .extract(&document, TargetVersion::V1)
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownSetting(ref p) if p == "cors.match_origins"));
    }

    #[test]
    fn extract_accepts_claimed_empty_values() {
        let document = ConfigDocument::from_yaml(
            "cors:\n  policies:\n    - origins: []\nconnectors:\n  sources:\n    a.b: {}\n",
        )
        .unwrap();
        let extraction = ConfigAdapter::new()
            .extract(&document, TargetVersion::V2)
            .unwrap();
        assert_eq!(extraction.settings.get("cors.origins"), Some(&Node::List(Vec::new())));
        assert_eq!(extraction.settings.get("connectors.sources.a.b"), Some(&Node::map()));
    }

    #[test]
    fn extract_connector_sources() {
        let document = ConfigDocument::from_yaml(
            "connectors:\n  sources:\n    products.v1:\n      override_url: http://localhost\n",
        )
        .unwrap();
        let extraction = ConfigAdapter::new()
            .extract(&document, TargetVersion::V2)
            .unwrap();
        let value = extraction
            .settings
            .get("connectors.sources.products.v1")
            .unwrap();
        assert_eq!(
            value.as_map().unwrap().get("override_url"),
            Some(&Node::from("http://localhost"))
        );
    }

    #[test]
    fn extract_v1_rejects_connectors() {
        let document =
            ConfigDocument::from_yaml("connectors:\n  sources:\n    a.b: {x: 1}\n").unwrap();
        let err = ConfigAdapter::new()
            .extract(&document, TargetVersion::V1)
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownSetting(_)));
    }

    #[test]
    fn extract_legacy_limits() {
        let document =
            ConfigDocument::from_yaml("preview_operation_limits:\n  max_depth: 12\n").unwrap();
        let extraction = ConfigAdapter::new()
            .extract(&document, TargetVersion::V1)
            .unwrap();
        assert_eq!(
            extraction.settings.get("limits.max_depth"),
            Some(&Node::Integer(12))
        );
        assert_eq!(extraction.notes[0].code, WarningCode::LegacyOperationLimits);
    }

    #[test]
    fn custom_passes_replace_defaults() {
        let adapter = ConfigAdapter::new().with_passes(Vec::new());
        let result = adapter
            .render(
                &request(TargetVersion::V2)
                    .profile(Profile::Production)
                    .setting("cors.origins", Node::strings(["*"]))
                    .build(),
            )
            .unwrap();
        assert!(!result.has_warnings());
    }
}
