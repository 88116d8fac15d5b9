//! Version-indexed settings table
//!
//! Every logical setting the adapter understands is one [`VersionedSetting`]
//! row: its key, the value type it accepts, and one optional [`Shape`] per
//! router major. Rendering and extraction are driven entirely by these rows;
//! supporting a new major means filling in a new column.
//!
//! Keys and paths may contain `{name}` placeholders. A placeholder in a key
//! captures exactly one dot-separated segment of the logical key and is
//! substituted into the shape's document path.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::error::{AdapterError, AdapterResult};
use crate::node::Node;
use crate::path::{DocPath, PathError};
use crate::version::TargetVersion;

/// Value captured by a placeholder, keyed by placeholder name
pub type Captures = Vec<(String, String)>;

/// Type of value a setting accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// List of strings
    Strings,
    /// Single string
    Text,
    /// Non-negative integer
    Count,
    /// Boolean
    Flag,
    /// Mapping with arbitrary content
    Mapping,
}

impl SettingKind {
    /// Human description used in error messages
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Strings => "a list of strings",
            Self::Text => "a string",
            Self::Count => "a non-negative integer",
            Self::Flag => "a boolean",
            Self::Mapping => "a mapping",
        }
    }

    #[must_use]
    pub fn accepts(self, node: &Node) -> bool {
        match (self, node) {
            (Self::Strings, Node::List(items)) => items.iter().all(|i| i.as_str().is_some()),
            (Self::Text, Node::String(_))
            | (Self::Flag, Node::Bool(_))
            | (Self::Mapping, Node::Map(_)) => true,
            (Self::Count, Node::Integer(i)) => *i >= 0,
            _ => false,
        }
    }

    /// Type-check `value` for `key`
    ///
    /// # Errors
    /// Returns [`AdapterError::InvalidValue`] on mismatch
    pub fn check(self, key: &str, value: &Node) -> AdapterResult<()> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(AdapterError::InvalidValue {
                key: key.to_string(),
                expected: self.expected(),
                found: value.type_name(),
            })
        }
    }
}

/// Structural transform applied when writing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Value written unchanged
    Identity,
    /// List of at most one string written as a single scalar
    SingularFromList,
}

impl Transform {
    /// Transform a logical value into its document form
    ///
    /// `Ok(None)` means there is nothing to write (an empty list flattened
    /// into a singular field).
    ///
    /// # Errors
    /// Returns [`AdapterError::VersionIncompatibleSetting`] when the value
    /// holds more than the target field can represent
    pub fn render(
        self,
        key: &str,
        value: &Node,
        version: TargetVersion,
    ) -> AdapterResult<Option<Node>> {
        match self {
            Self::Identity => Ok(Some(value.clone())),
            Self::SingularFromList => match value.as_list().unwrap_or_default() {
                [] => Ok(None),
                [single] => Ok(Some(single.clone())),
                _ => Err(AdapterError::incompatible(key, version)),
            },
        }
    }

    /// Turn a document value back into its logical form
    #[must_use]
    pub fn invert(self, node: Node) -> Node {
        match (self, node) {
            (Self::SingularFromList, scalar @ Node::String(_)) => Node::List(vec![scalar]),
            (_, node) => node,
        }
    }
}

/// Serialization shape of a setting for one version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Document path template
    pub path: &'static str,
    pub transform: Transform,
}

impl Shape {
    const fn at(path: &'static str) -> Self {
        Self {
            path,
            transform: Transform::Identity,
        }
    }

    const fn singular(path: &'static str) -> Self {
        Self {
            path,
            transform: Transform::SingularFromList,
        }
    }

    /// Parse the path template, placeholders left in place
    ///
    /// # Errors
    /// Returns error if the template is malformed
    pub fn template(&self) -> Result<DocPath, PathError> {
        DocPath::from_str(self.path)
    }

    /// Document path with placeholders filled from `captures`
    ///
    /// # Errors
    /// Returns error if the template is malformed
    pub fn resolve(&self, captures: &Captures) -> Result<DocPath, PathError> {
        self.template()?
            .map_keys(|key| Ok(substitute(key, captures)))
    }
}

/// One logical setting and its per-version shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedSetting {
    /// Logical key, possibly with `{name}` placeholders
    pub key: &'static str,
    pub kind: SettingKind,
    pub v1: Option<Shape>,
    pub v2: Option<Shape>,
    /// Older v1 spelling accepted when reading documents
    pub v1_legacy: Option<&'static str>,
    /// Whether extraction produces this key. Non-canonical rows are
    /// alternate inputs already covered by a canonical row.
    pub canonical: bool,
    pub migration_note: Option<&'static str>,
}

impl VersionedSetting {
    const fn same(key: &'static str, kind: SettingKind, path: &'static str) -> Self {
        Self {
            key,
            kind,
            v1: Some(Shape::at(path)),
            v2: Some(Shape::at(path)),
            v1_legacy: None,
            canonical: true,
            migration_note: None,
        }
    }

    const fn split(key: &'static str, kind: SettingKind, v1: Shape, v2: Shape) -> Self {
        Self {
            key,
            kind,
            v1: Some(v1),
            v2: Some(v2),
            v1_legacy: None,
            canonical: true,
            migration_note: None,
        }
    }

    const fn v2_only(key: &'static str, kind: SettingKind, path: &'static str) -> Self {
        Self {
            key,
            kind,
            v1: None,
            v2: Some(Shape::at(path)),
            v1_legacy: None,
            canonical: true,
            migration_note: None,
        }
    }

    const fn legacy(mut self, path: &'static str) -> Self {
        self.v1_legacy = Some(path);
        self
    }

    const fn alias(mut self) -> Self {
        self.canonical = false;
        self
    }

    const fn note(mut self, note: &'static str) -> Self {
        self.migration_note = Some(note);
        self
    }

    /// Shape for `version`, if the setting exists there
    #[inline]
    #[must_use]
    pub const fn shape(&self, version: TargetVersion) -> Option<&Shape> {
        match version {
            TargetVersion::V1 => self.v1.as_ref(),
            TargetVersion::V2 => self.v2.as_ref(),
        }
    }

    /// Whether the key contains placeholders
    #[inline]
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        self.key.contains('{')
    }

    /// Versions this setting can be rendered for
    pub fn versions(&self) -> impl Iterator<Item = TargetVersion> + '_ {
        TargetVersion::ALL
            .into_iter()
            .filter(|v| self.shape(*v).is_some())
    }

    /// Match a concrete logical key against this row
    #[must_use]
    pub fn captures(&self, key: &str) -> Option<Captures> {
        let mut captures = Vec::new();
        let mut pattern = self.key.split('.');
        let mut actual = key.split('.');
        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(captures),
                (Some(p), Some(a)) => {
                    if let Some(name) = placeholder(p) {
                        if !valid_capture(a) {
                            return None;
                        }
                        captures.push((name.to_string(), a.to_string()));
                    } else if p != a {
                        return None;
                    }
                }
                _ => return None,
            }
        }
    }
}

use SettingKind::{Count, Flag, Mapping, Strings, Text};

static SETTINGS: [VersionedSetting; 28] = [
    VersionedSetting::same("supergraph.listen", Text, "supergraph.listen"),
    VersionedSetting::same("supergraph.path", Text, "supergraph.path"),
    VersionedSetting::same("supergraph.introspection", Flag, "supergraph.introspection"),
    VersionedSetting::same("homepage.enabled", Flag, "homepage.enabled"),
    VersionedSetting::same("sandbox.enabled", Flag, "sandbox.enabled"),
    VersionedSetting::same("health_check.enabled", Flag, "health_check.enabled"),
    VersionedSetting::same("health_check.listen", Text, "health_check.listen"),
    VersionedSetting::same("health_check.path", Text, "health_check.path"),
    VersionedSetting::same("cors.allow_any_origin", Flag, "cors.allow_any_origin"),
    VersionedSetting::split(
        "cors.origins",
        Strings,
        Shape::at("cors.origins"),
        Shape::at("cors.policies[0].origins"),
    )
    .note("v2 groups origins into policies; a flat list becomes a single policy"),
    VersionedSetting::split(
        "cors.allow_credentials",
        Flag,
        Shape::at("cors.allow_credentials"),
        Shape::at("cors.policies[0].allow_credentials"),
    )
    .note("v2 sets credentials per policy"),
    VersionedSetting::split(
        "cors.allow_headers",
        Strings,
        Shape::at("cors.allow_headers"),
        Shape::at("cors.policies[0].allow_headers"),
    )
    .note("v2 sets allowed headers per policy"),
    VersionedSetting::split(
        "cors.methods",
        Strings,
        Shape::at("cors.methods"),
        Shape::at("cors.policies[0].methods"),
    )
    .note("v2 sets allowed methods per policy"),
    VersionedSetting::same("jwt.header_name", Text, "authentication.router.jwt.header_name"),
    VersionedSetting::same("jwt.jwks_url", Text, "authentication.router.jwt.jwks[0].url"),
    VersionedSetting::split(
        "jwt.issuers",
        Strings,
        Shape::singular("authentication.router.jwt.jwks[0].issuer"),
        Shape::at("authentication.router.jwt.jwks[0].issuers"),
    )
    .note("v1 accepts a single `issuer`; v2 accepts a list of `issuers`"),
    VersionedSetting::same("limits.max_depth", Count, "limits.max_depth")
        .legacy("preview_operation_limits.max_depth")
        .note("`preview_operation_limits` was renamed to `limits`"),
    VersionedSetting::same("limits.max_height", Count, "limits.max_height")
        .legacy("preview_operation_limits.max_height")
        .note("`preview_operation_limits` was renamed to `limits`"),
    VersionedSetting::same("limits.max_aliases", Count, "limits.max_aliases")
        .legacy("preview_operation_limits.max_aliases")
        .note("`preview_operation_limits` was renamed to `limits`"),
    VersionedSetting::same("limits.max_root_fields", Count, "limits.max_root_fields")
        .legacy("preview_operation_limits.max_root_fields")
        .note("`preview_operation_limits` was renamed to `limits`"),
    VersionedSetting::same(
        "limits.http_max_request_bytes",
        Count,
        "limits.http_max_request_bytes",
    ),
    VersionedSetting::same(
        "rate_limit.capacity",
        Count,
        "traffic_shaping.router.global_rate_limit.capacity",
    ),
    VersionedSetting::same(
        "rate_limit.interval",
        Text,
        "traffic_shaping.router.global_rate_limit.interval",
    ),
    VersionedSetting::same(
        "telemetry.service_name",
        Text,
        "telemetry.exporters.tracing.common.service_name",
    ),
    VersionedSetting::same("include_subgraph_errors.all", Flag, "include_subgraph_errors.all"),
    VersionedSetting::v2_only(
        "connectors.sources.{subgraph}.{source}",
        Mapping,
        r#"connectors.sources."{subgraph}.{source}""#,
    )
    .note("connectors require router v2"),
    VersionedSetting::v2_only(
        "connectors.sources.{subgraph}.{source}.override_url",
        Text,
        r#"connectors.sources."{subgraph}.{source}".override_url"#,
    )
    .alias()
    .note("connectors require router v2"),
    VersionedSetting::v2_only(
        "connectors.sources.{subgraph}.{source}.$config",
        Mapping,
        r#"connectors.sources."{subgraph}.{source}".$config"#,
    )
    .alias()
    .note("connectors require router v2"),
];

static TABLE: Lazy<SettingsTable> = Lazy::new(|| SettingsTable::new(&SETTINGS));

/// Built-in settings table
#[inline]
#[must_use]
pub fn table() -> &'static SettingsTable {
    &TABLE
}

/// A table row matched against a concrete logical key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingMatch<'a> {
    /// Row position; rows render in this order
    pub rank: usize,
    pub setting: &'a VersionedSetting,
    pub captures: Captures,
}

/// Read-only lookup over [`VersionedSetting`] rows
#[derive(Debug)]
pub struct SettingsTable {
    entries: &'static [VersionedSetting],
    literal: HashMap<&'static str, usize>,
}

impl SettingsTable {
    /// Index the given rows
    #[must_use]
    pub fn new(entries: &'static [VersionedSetting]) -> Self {
        let literal = entries
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_pattern())
            .map(|(i, s)| (s.key, i))
            .collect();
        Self { entries, literal }
    }

    /// Find the row for a logical key
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<SettingMatch<'_>> {
        if let Some(&rank) = self.literal.get(key) {
            return Some(SettingMatch {
                rank,
                setting: &self.entries[rank],
                captures: Vec::new(),
            });
        }
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_pattern())
            .find_map(|(rank, setting)| {
                setting.captures(key).map(|captures| SettingMatch {
                    rank,
                    setting,
                    captures,
                })
            })
    }

    /// Rows in render order
    pub fn iter(&self) -> impl Iterator<Item = &VersionedSetting> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

/// Placeholder values are plain identifiers
fn valid_capture(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Replace every `{name}` in `text` with its captured value
#[must_use]
pub fn substitute(text: &str, captures: &Captures) -> String {
    captures
        .iter()
        .fold(text.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        })
}

/// Match `text` against a pattern such as `{subgraph}.{source}`
///
/// Each placeholder captures up to the next literal of the pattern.
/// Adjacent placeholders are not supported.
#[must_use]
pub fn match_pattern(pattern: &str, text: &str) -> Option<Captures> {
    let mut captures = Vec::new();
    let mut rest_p = pattern;
    let mut rest_t = text;
    loop {
        let Some(open) = rest_p.find('{') else {
            return (rest_p == rest_t).then_some(captures);
        };
        rest_t = rest_t.strip_prefix(&rest_p[..open])?;
        let after = &rest_p[open..];
        let close = after.find('}')?;
        let name = &after[1..close];
        rest_p = &after[close + 1..];

        let next_literal = &rest_p[..rest_p.find('{').unwrap_or(rest_p.len())];
        let len = if next_literal.is_empty() {
            if !rest_p.is_empty() {
                return None;
            }
            rest_t.len()
        } else {
            rest_t.find(next_literal)?
        };
        let value = &rest_t[..len];
        if !valid_capture(value) {
            return None;
        }
        captures.push((name.to_string(), value.to_string()));
        rest_t = &rest_t[len..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_row_has_a_shape() {
        for setting in table().iter() {
            assert!(
                setting.v1.is_some() || setting.v2.is_some(),
                "{} has no shape",
                setting.key
            );
        }
    }

    #[test]
    fn every_template_parses() {
        for setting in table().iter() {
            for version in setting.versions() {
                let shape = setting.shape(version).unwrap();
                assert!(shape.template().is_ok(), "{} {}", setting.key, shape.path);
            }
            if let Some(legacy) = setting.v1_legacy {
                assert!(legacy.parse::<DocPath>().is_ok());
            }
        }
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = table().iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), table().len());
    }

    #[test]
    fn lookup_literal() {
        let found = table().lookup("cors.origins").unwrap();
        assert_eq!(found.setting.kind, SettingKind::Strings);
        assert!(found.captures.is_empty());
    }

    #[test]
    fn lookup_pattern_captures_segments() {
        let found = table().lookup("connectors.sources.products.v1").unwrap();
        assert_eq!(
            found.captures,
            vec![
                ("subgraph".to_string(), "products".to_string()),
                ("source".to_string(), "v1".to_string()),
            ]
        );
        assert!(found.setting.v1.is_none());
    }

    #[test]
    fn lookup_pattern_with_suffix() {
        let found = table()
            .lookup("connectors.sources.products.v1.$config")
            .unwrap();
        assert!(!found.setting.canonical);
        let path = found.setting.v2.unwrap().resolve(&found.captures).unwrap();
        assert_eq!(path.to_string(), r#"connectors.sources."products.v1".$config"#);
    }

    #[test]
    fn lookup_unknown() {
        assert!(table().lookup("jwt.issuer").is_none());
        assert!(table().lookup("connectors.sources.a").is_none());
        assert!(table().lookup("connectors.sources.a.b.c.d").is_none());
    }

    #[test]
    fn kind_accepts() {
        assert!(SettingKind::Strings.accepts(&Node::strings(["a"])));
        assert!(!SettingKind::Strings.accepts(&Node::List(vec![Node::Integer(1)])));
        assert!(SettingKind::Count.accepts(&Node::Integer(0)));
        assert!(!SettingKind::Count.accepts(&Node::Integer(-1)));
        assert!(!SettingKind::Flag.accepts(&Node::String("true".to_string())));
    }

    #[test]
    fn singular_transform() {
        let t = Transform::SingularFromList;
        let one = t
            .render("jwt.issuers", &Node::strings(["a"]), TargetVersion::V1)
            .unwrap();
        assert_eq!(one, Some(Node::from("a")));
        assert_eq!(
            t.render("jwt.issuers", &Node::List(vec![]), TargetVersion::V1)
                .unwrap(),
            None
        );
        assert!(t
            .render("jwt.issuers", &Node::strings(["a", "b"]), TargetVersion::V1)
            .is_err());
        assert_eq!(t.invert(Node::from("a")), Node::strings(["a"]));
    }

    #[test]
    fn pattern_matching() {
        let caps = match_pattern("{subgraph}.{source}", "products.v1").unwrap();
        assert_eq!(substitute("{source}@{subgraph}", &caps), "v1@products");
        assert!(match_pattern("{subgraph}.{source}", "products").is_none());
        assert!(match_pattern("{subgraph}.{source}", "a.b.c").is_none());
        assert!(match_pattern("fixed", "fixed").unwrap().is_empty());
    }
}
