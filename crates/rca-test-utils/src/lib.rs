//! Testing utilities for RCA workspace
//!
//! Shared fixtures: settings maps, requests and router documents.

#![allow(missing_docs)]

use rca_core::{
    ConfigDocument, Node, NodeMap, Profile, RenderRequest, RenderResult, SettingsMap,
    TargetVersion, WarningCode,
};

/// A v1 router document written the way older routers were configured
pub const SAMPLE_V1_ROUTER_YAML: &str = r"supergraph:
  listen: 0.0.0.0:4000
  introspection: false
health_check:
  enabled: true
cors:
  origins:
    - https://studio.apollographql.com
  allow_credentials: true
authentication:
  router:
    jwt:
      jwks:
        - url: https://idp.example.com/.well-known/jwks.json
          issuer: https://idp.example.com
preview_operation_limits:
  max_depth: 15
  max_aliases: 30
traffic_shaping:
  router:
    global_rate_limit:
      capacity: 500
      interval: 1s
";

pub fn strings(items: &[&str]) -> Node {
    Node::strings(items.iter().copied())
}

/// Settings every version can express, with nothing a production pass flags
pub fn v1_compatible_settings() -> SettingsMap {
    let mut settings = SettingsMap::new();
    let mut put = |key: &str, value: Node| {
        settings.insert(key.to_string(), value);
    };
    put("supergraph.listen", "0.0.0.0:4000".into());
    put("supergraph.path", "/graphql".into());
    put("supergraph.introspection", false.into());
    put("homepage.enabled", false.into());
    put("sandbox.enabled", false.into());
    put("health_check.enabled", true.into());
    put("health_check.listen", "0.0.0.0:8088".into());
    put("health_check.path", "/health".into());
    put("cors.allow_any_origin", false.into());
    put("cors.origins", strings(&["https://studio.apollographql.com"]));
    put("cors.allow_credentials", true.into());
    put("cors.allow_headers", strings(&["content-type", "authorization"]));
    put("cors.methods", strings(&["GET", "POST"]));
    put("jwt.header_name", "Authorization".into());
    put("jwt.jwks_url", "https://idp.example.com/.well-known/jwks.json".into());
    put("jwt.issuers", strings(&["https://idp.example.com"]));
    put("limits.max_depth", Node::Integer(15));
    put("limits.max_height", Node::Integer(200));
    put("limits.max_aliases", Node::Integer(30));
    put("limits.max_root_fields", Node::Integer(20));
    put("limits.http_max_request_bytes", Node::Integer(2_000_000));
    put("rate_limit.capacity", Node::Integer(500));
    put("rate_limit.interval", "1s".into());
    put("telemetry.service_name", "router".into());
    put("include_subgraph_errors.all", false.into());
    settings
}

/// One connector source mapping
pub fn connector_source(override_url: &str) -> Node {
    let mut config = NodeMap::new();
    config.insert("api_key".to_string(), "${env.API_KEY}".into());
    let mut source = NodeMap::new();
    source.insert("override_url".to_string(), override_url.into());
    source.insert("$config".to_string(), Node::Map(config));
    Node::Map(source)
}

/// Every canonical setting, including the v2-only ones
pub fn full_v2_settings() -> SettingsMap {
    let mut settings = v1_compatible_settings();
    settings.insert(
        "jwt.issuers".to_string(),
        strings(&["https://idp.example.com", "https://backup.example.com"]),
    );
    settings.insert(
        "connectors.sources.products.v1".to_string(),
        connector_source("http://localhost:4010"),
    );
    settings
}

pub fn request(version: TargetVersion, profile: Profile, settings: SettingsMap) -> RenderRequest {
    RenderRequest::builder(version)
        .profile(profile)
        .settings(settings)
        .build()
}

pub fn production_request(version: TargetVersion, settings: SettingsMap) -> RenderRequest {
    request(version, Profile::Production, settings)
}

/// Parse a YAML document, panicking on bad fixtures
pub fn document(yaml: &str) -> ConfigDocument {
    ConfigDocument::from_yaml(yaml).unwrap()
}

/// Warning codes of a result, in order
pub fn codes(result: &RenderResult) -> Vec<WarningCode> {
    result.warnings().iter().map(|w| w.code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_document_parses() {
        let doc = document(SAMPLE_V1_ROUTER_YAML);
        assert!(doc.get_str("preview_operation_limits.max_depth").is_some());
    }

    #[test]
    fn full_settings_extend_v1() {
        let v1 = v1_compatible_settings();
        let v2 = full_v2_settings();
        assert!(v2.len() > v1.len());
        assert!(v1.keys().all(|k| v2.contains_key(k)));
    }
}
